//! Trybuild fixture verifying `#[merge(crate = "...")]` works with a
//! dependency rename via `use ... as`.

use tagmerge as tm;
use tm::Aggregate;

#[derive(Aggregate, Default)]
#[merge(crate = "tm")]
struct Aliased {
    #[merge(from = "")]
    value: Option<u32>,
}

fn main() {
    let mut dest = Aliased::default();
    let source = Aliased { value: Some(1) };
    let _: tm::MergeResult<tm::MergeReport> = tm::merge_by_destination(&mut dest, &source);
}
