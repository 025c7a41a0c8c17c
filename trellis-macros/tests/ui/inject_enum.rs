#![allow(missing_docs)]

use trellis_macros::Inject;

#[derive(Inject)]
enum Mode {
    Fast,
}

fn main() {
    let _ = Mode::Fast;
}
