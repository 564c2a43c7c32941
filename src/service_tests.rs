use super::*;
use crate::error::StoreError;

fn service() -> (tempfile::TempDir, RouteService) {
    let tmp = tempfile::tempdir().unwrap();
    let svc = RouteService::open(tmp.path()).unwrap();
    (tmp, svc)
}

#[test]
fn scenario_add_then_list() {
    let (_tmp, svc) = service();
    svc.create_route("Alpha").unwrap().unwrap();
    let rec = Record::new("Acme", "1 Main St", "", "");
    svc.add_record("alpha", rec.clone(), Position::parse("end")).unwrap();
    assert_eq!(svc.list_records("alpha").unwrap(), vec![rec]);
}

#[test]
fn scenario_fuzzy_search() {
    let (_tmp, svc) = service();
    svc.create_route("Alpha").unwrap().unwrap();
    svc.add_record("alpha", Record::new("Foo Bar", "", "", ""), Position::End).unwrap();
    svc.add_record("alpha", Record::new("Baz", "", "", ""), Position::End).unwrap();
    let hits = svc.search("foobr", &[Field::Company]).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.company, "Foo Bar");
    assert_eq!(hits[0].route_title, "Alpha");
}

#[test]
fn scenario_transfer() {
    let (_tmp, svc) = service();
    svc.create_route("a").unwrap().unwrap();
    svc.create_route("b").unwrap().unwrap();
    let rec = Record::new("Acme", "", "", "");
    svc.add_record("b", Record::new("Existing", "", "", ""), Position::End).unwrap();
    svc.add_record("a", rec.clone(), Position::End).unwrap();
    assert!(svc.transfer_record("a", "b", 0).unwrap());
    assert!(svc.list_records("a").unwrap().is_empty());
    let b = svc.list_records("b").unwrap();
    assert_eq!(b.len(), 2);
    assert_eq!(b[1], rec);
}

#[test]
fn scenario_slugged_route() {
    let (_tmp, svc) = service();
    let cfg = svc.create_route("Barra Shopping!").unwrap().unwrap();
    for s in [&cfg.id, &cfg.storage_name] {
        let stem = s.trim_end_matches(".csv");
        assert!(stem.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'), "{s}");
    }
    assert!(svc.list_routes().unwrap().iter().any(|r| r.id == "barra_shopping"));
}

#[test]
fn route_lifecycle() {
    let (_tmp, svc) = service();
    let seeded = svc.list_routes().unwrap().len();
    svc.create_route("Zona Norte").unwrap().unwrap();
    assert!(svc.create_route("zona norte").unwrap().is_none());
    assert_eq!(svc.rename_route("zona_norte", "Zona Norte II").unwrap().unwrap().title, "Zona Norte II");
    assert!(svc.rename_route("missing", "x").unwrap().is_none());
    assert_eq!(svc.list_routes().unwrap().len(), seeded + 1);
    assert!(svc.remove_route("zona_norte").unwrap());
    assert!(!svc.remove_route("zona_norte").unwrap());
    assert!(matches!(svc.list_records("zona_norte"), Err(StoreError::RouteNotFound(_))));
}

#[test]
fn record_edits_report_noops() {
    let (_tmp, svc) = service();
    for name in ["a", "b", "c"] {
        svc.add_record("paulo", Record::new(name, "", "", ""), Position::End).unwrap();
    }
    let patch = RecordPatch::from(Record::new("B", "Rua 2", "", ""));
    assert!(svc.update_record("paulo", 1, &patch).unwrap());
    assert!(!svc.update_record("paulo", 9, &patch).unwrap());
    assert!(svc.swap_records("paulo", 0, 2).unwrap());
    assert!(!svc.swap_records("paulo", 1, 1).unwrap());
    assert!(svc.delete_record("paulo", 0).unwrap());
    assert!(!svc.delete_record("paulo", 5).unwrap());
    let names: Vec<String> = svc.list_records("paulo").unwrap().into_iter().map(|r| r.company).collect();
    assert_eq!(names, vec!["B", "a"]);
}

#[test]
fn reorder_length_mismatch_surfaces() {
    let (_tmp, svc) = service();
    svc.add_record("yago", Record::new("x", "", "", ""), Position::End).unwrap();
    svc.add_record("yago", Record::new("y", "", "", ""), Position::End).unwrap();
    assert!(matches!(
        svc.reorder_records("yago", &[0]),
        Err(StoreError::LengthMismatch { expected: 2, actual: 1 })
    ));
    svc.reorder_records("yago", &[1, 0]).unwrap();
    assert_eq!(svc.list_records("yago").unwrap()[0].company, "y");
}

#[test]
fn unknown_route_errors_for_every_record_operation() {
    let (_tmp, svc) = service();
    let nf = |r: StoreResult<()>| matches!(r, Err(StoreError::RouteNotFound(_)));
    assert!(nf(svc.add_record("ghost", Record::default(), Position::End).map(|_| ())));
    assert!(nf(svc.update_record("ghost", 0, &RecordPatch::default()).map(|_| ())));
    assert!(nf(svc.delete_record("ghost", 0).map(|_| ())));
    assert!(nf(svc.swap_records("ghost", 0, 1).map(|_| ())));
    assert!(nf(svc.reorder_records("ghost", &[])));
    assert!(nf(svc.transfer_record("ghost", "paulo", 0).map(|_| ())));
}

#[test]
fn threshold_comes_from_config() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = ServerConfig { data_root: tmp.path().to_path_buf(), search_threshold: 100.0, ..ServerConfig::default() };
    let svc = RouteService::from_config(&cfg).unwrap();
    svc.add_record("jairo", Record::new("Foo Bar", "", "", ""), Position::End).unwrap();
    assert!(svc.search("foobr", &[]).unwrap().is_empty());
    assert_eq!(svc.search("foo bar", &[]).unwrap().len(), 1);
}

#[test]
fn recreated_route_does_not_resurrect_records() {
    let (_tmp, svc) = service();
    svc.create_route("Zona").unwrap().unwrap();
    svc.add_record("zona", Record::new("old", "", "", ""), Position::End).unwrap();
    assert!(svc.remove_route("zona").unwrap());
    svc.create_route("Zona").unwrap().unwrap();
    assert!(svc.list_records("zona").unwrap().is_empty());
}
