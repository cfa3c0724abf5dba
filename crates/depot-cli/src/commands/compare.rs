//! Handler for `depot compare`.

use miette::Result;

use depot_core::version;

pub fn exec(a: &str, b: &str) -> Result<()> {
    println!("{}", version::compare(a, b));
    Ok(())
}
