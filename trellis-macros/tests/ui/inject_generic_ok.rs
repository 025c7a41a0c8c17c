#![allow(missing_docs)]

use std::marker::PhantomData;
use trellis::{ContainerBuilder, Dc};
use trellis_macros::Inject;

#[derive(Default)]
struct Postgres;

#[derive(Inject)]
struct Repository<D: Send + Sync + 'static> {
    db: Dc<D>,
    #[inject(default)]
    _marker: PhantomData<D>,
}

fn main() {
    let mut builder = ContainerBuilder::new();
    builder.register_singleton(Postgres);
    builder.register_scoped::<Repository<Postgres>>();

    let container = builder.build().unwrap();
    let scope = container.create_scope();

    assert!(scope.resolve::<Repository<Postgres>>().is_ok());
    let _ = &scope.resolve::<Repository<Postgres>>().unwrap().db;
}
