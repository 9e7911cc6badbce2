//! Trybuild fixture covering every supported field shape.

use tagmerge::{Aggregate, MergeReport, MergeResult, merge_by_destination};

#[derive(Aggregate, Clone, Default)]
struct Leaf {
    #[merge(from = "", into = "")]
    value: Option<u8>,
}

#[derive(Aggregate, Default)]
struct Shapes {
    #[merge(from = "")]
    direct: String,
    #[merge(from = "other,nooverwrite,omitmissing")]
    optional: Option<u64>,
    #[merge(from = "", nested)]
    inline: Leaf,
    #[merge(from = "", nested)]
    maybe: Option<Leaf>,
    #[merge(from = "", into = "", nested = true)]
    boxed: Option<Box<Shapes>>,
    #[merge(readonly = false)]
    plain: &'static str,
    #[merge(skip)]
    _handle: Option<std::sync::Mutex<u8>>,
    r#ref: bool,
    #[merge(view)]
    lock: std::sync::Mutex<u8>,
    #[merge(from = "", view)]
    maybe_lock: Option<std::sync::Mutex<u8>>,
}

fn main() {
    let mut dest = Shapes::default();
    let source = Shapes::default();
    let _: MergeResult<MergeReport> = merge_by_destination(&mut dest, &source);
}
