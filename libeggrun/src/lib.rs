pub mod memory;
pub mod policy;
pub mod probe;
pub mod version;

#[cfg(test)]
#[ctor::ctor]
fn init_backtrace() {
    color_backtrace::install();
}
