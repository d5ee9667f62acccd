//! Concurrent first reads of memoized values
//!
//! Export values, catalog part views and synthesized constraints are
//! computed on first use and published once. These tests race several
//! threads on that first use and check every reader converges.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use cim_composition::{
    ComposablePartCatalog, ComposablePartDefinition, ContractBasedImportDefinition,
    ContractIndexedCatalog, Export, ExportDefinition, ImportDefinition, PartCatalog,
    PartDefinition,
};

const READERS: usize = 8;

/// Test an impure producer still yields one value for every reader
#[test]
fn test_export_value_converges() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let export = Arc::new(Export::new(
        ExportDefinition::for_contract("Counter").unwrap(),
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Arc::new(n) as Arc<dyn std::any::Any + Send + Sync>))
        },
    ));
    let barrier = Arc::new(Barrier::new(READERS));

    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let export = Arc::clone(&export);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                *export.value_as::<usize>().unwrap().unwrap()
            })
        })
        .collect();
    let seen: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let published = *export.value_as::<usize>().unwrap().unwrap();
    assert!(seen.iter().all(|v| *v == published));
    assert!(calls.load(Ordering::SeqCst) >= 1);
    assert!(export.is_value_created());

    // Settled: no further producer calls.
    let settled = calls.load(Ordering::SeqCst);
    for _ in 0..10 {
        export.value().unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), settled);
}

/// Test a null export value is memoized like any other value
#[test]
fn test_null_value_memoized() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let export = Export::new(ExportDefinition::for_contract("Nothing").unwrap(), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    });

    assert!(export.value().unwrap().is_none());
    assert!(export.value().unwrap().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

fn catalog_parts() -> Vec<Arc<dyn ComposablePartDefinition>> {
    (0..64)
        .map(|i| {
            PartDefinition::new(format!("P{i}"))
                .with_export(ExportDefinition::for_contract(format!("C{}", i % 4)).unwrap())
                .into_shared()
        })
        .collect()
}

/// Test concurrent first queries share one parts view and agree on results
#[test]
fn test_catalog_first_queries_converge() {
    let catalogs: Vec<Arc<dyn ComposablePartCatalog>> = vec![
        Arc::new(PartCatalog::new(catalog_parts())),
        Arc::new(ContractIndexedCatalog::new(catalog_parts())),
    ];

    for catalog in catalogs {
        let barrier = Arc::new(Barrier::new(READERS));
        let handles: Vec<_> = (0..READERS)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let import = ContractBasedImportDefinition::new("C1").unwrap();
                    let names: Vec<String> = catalog
                        .get_exports(&import)
                        .unwrap()
                        .iter()
                        .map(|m| m.part().display_name())
                        .collect();
                    (catalog.parts().unwrap(), names)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let (first_view, first_names) = &results[0];
        assert_eq!(first_names.len(), 16);
        for (view, names) in &results {
            assert!(Arc::ptr_eq(view, first_view));
            assert_eq!(names, first_names);
        }
    }
}

/// Test one shared import definition used from many threads
#[test]
fn test_shared_import_constraint() {
    let import = Arc::new(ContractBasedImportDefinition::new("C2").unwrap());
    let barrier = Arc::new(Barrier::new(READERS));

    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let import = Arc::clone(&import);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                import.constraint().unwrap()
            })
        })
        .collect();
    let constraints: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let published = import.constraint().unwrap();
    assert!(constraints.iter().all(|c| c.ptr_eq(&published)));
    assert!(published.is_satisfied_by(&ExportDefinition::for_contract("C2").unwrap()));
}
