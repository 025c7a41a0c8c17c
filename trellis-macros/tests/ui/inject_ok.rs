#![allow(missing_docs)]

use std::marker::PhantomData;
use std::sync::Arc;
use trellis::{ContainerBuilder, Dc, ParameterKind};
use trellis_macros::Inject;

#[derive(Default)]
struct Config;

struct Audit;

#[derive(Inject)]
struct Service {
    config: Dc<Config>,
    audit: Option<Dc<Audit>>,
    shared: Arc<Config>,
    _marker: PhantomData<Audit>,
    #[inject(default)]
    retries: u32,
}

#[derive(Inject)]
struct Pair(Dc<Config>, #[inject(default)] String);

#[derive(Inject)]
struct Marker;

fn main() {
    let mut builder = ContainerBuilder::new();
    builder.register_singleton(Config);
    builder.register_transient::<Service>();
    builder.register_transient::<Pair>();
    builder.register_transient::<Marker>();

    let container = builder.build().unwrap();
    let service = container.resolve::<Service>().unwrap();

    assert!(service.audit.is_none());
    assert!(Arc::ptr_eq(&service.config.clone().into_inner(), &service.shared));
    assert!(matches!(<Service as trellis::Inject>::signature().parameters()[3].kind(), ParameterKind::CatchAll));
    assert_eq!(service.retries, 0);

    let pair = container.resolve::<Pair>().unwrap();
    assert!(pair.1.is_empty());

    assert!(container.resolve::<Marker>().is_ok());
    assert!(matches!(<Service as trellis::Inject>::signature().parameters()[4].kind(), ParameterKind::Default));
}
