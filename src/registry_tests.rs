use super::*;

fn registry() -> (tempfile::TempDir, RouteRegistry) {
    let tmp = tempfile::tempdir().unwrap();
    let reg = RouteRegistry::open(tmp.path());
    (tmp, reg)
}

#[test]
fn slugify_drops_punctuation() {
    assert_eq!(slugify("Barra Shopping!"), "barra_shopping");
    assert_eq!(slugify("  Coleta Yago + Jairo "), "coleta_yago_jairo");
    assert_eq!(slugify("rio--design__manhã"), "rio_design_manhã");
    assert_eq!(slugify("Rota 66"), "rota_66");
    assert_eq!(slugify("?!"), "");
}

#[test]
fn slug_contains_only_lowercase_letters_digits_underscores() {
    for title in ["Barra Shopping!", "A.B,C;D", "Norte - Sul (2)", "  x  y  "] {
        let s = slugify(title);
        assert!(!s.is_empty());
        assert!(
            s.chars().all(|c| c == '_' || c.is_numeric() || (c.is_alphabetic() && !c.is_uppercase())),
            "unexpected char in {s:?}"
        );
    }
}

#[test]
fn first_load_seeds_defaults_and_persists() {
    let (_tmp, reg) = registry();
    assert!(!reg.registry_path().exists());
    let routes = reg.load().unwrap();
    assert_eq!(routes.len(), DEFAULT_ROUTES.len());
    assert!(reg.registry_path().exists());
    let paulo = &routes["paulo"];
    assert_eq!(paulo.title, "Coleta Paulo");
    assert_eq!(paulo.storage_name, "coleta_paulo.csv");
}

#[test]
fn persisted_document_maps_id_to_title_and_storage_name() {
    let (_tmp, reg) = registry();
    reg.load().unwrap();
    let text = std::fs::read_to_string(reg.registry_path()).unwrap();
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["everton"]["title"], "Coleta Everton");
    assert_eq!(v["everton"]["storageName"], "coleta_everton.csv");
}

#[test]
fn create_registers_route_and_initializes_file() {
    let (tmp, reg) = registry();
    let cfg = reg.create("Barra Shopping!").unwrap().expect("created");
    assert_eq!(cfg.id, "barra_shopping");
    assert_eq!(cfg.title, "Barra Shopping!");
    assert_eq!(cfg.storage_name, "coleta_barra_shopping.csv");
    assert!(tmp.path().join(&cfg.storage_name).exists());
    assert_eq!(reg.get("barra_shopping").unwrap(), Some(cfg));
}

#[test]
fn create_is_noop_for_existing_or_empty_id() {
    let (_tmp, reg) = registry();
    assert!(reg.create("Paulo").unwrap().is_none());
    assert!(reg.create("!!!").unwrap().is_none());
    let before = reg.load().unwrap();
    assert!(reg.create("PAULO ").unwrap().is_none());
    assert_eq!(reg.load().unwrap(), before);
}

#[test]
fn rename_updates_title_only() {
    let (_tmp, reg) = registry();
    let renamed = reg.rename("jairo", "Jairo (tarde)").unwrap().expect("renamed");
    assert_eq!(renamed.id, "jairo");
    assert_eq!(renamed.storage_name, "coleta_jairo.csv");
    assert_eq!(reg.get("jairo").unwrap().unwrap().title, "Jairo (tarde)");
    assert!(reg.rename("nope", "x").unwrap().is_none());
    assert!(reg.rename("jairo", "   ").unwrap().is_none());
}

#[test]
fn remove_leaves_backing_file() {
    let (tmp, reg) = registry();
    let cfg = reg.create("Zona Sul").unwrap().unwrap();
    assert!(reg.remove(&cfg.id).unwrap());
    assert!(reg.get(&cfg.id).unwrap().is_none());
    assert!(tmp.path().join(&cfg.storage_name).exists());
    assert!(!reg.remove(&cfg.id).unwrap());
}

#[test]
fn save_overwrites_whole_document() {
    let (_tmp, reg) = registry();
    let mut only = RouteMap::new();
    only.insert(
        "alpha".into(),
        RouteConfig { id: "alpha".into(), title: "Alpha".into(), storage_name: "alpha.csv".into() },
    );
    reg.save(&only).unwrap();
    let loaded = reg.load().unwrap();
    assert_eq!(loaded, only);
}

#[test]
fn invalid_registry_document_is_an_error() {
    let (_tmp, reg) = registry();
    std::fs::write(reg.registry_path(), "{ not json").unwrap();
    match reg.load() {
        Err(StoreError::Registry(msg)) => assert!(msg.contains("not a valid route registry")),
        other => panic!("expected registry error, got {:?}", other.map(|m| m.len())),
    }
}

#[test]
fn recreate_after_remove_starts_empty_and_keeps_old_file_aside() {
    let (tmp, reg) = registry();
    let cfg = reg.create("Zona").unwrap().unwrap();
    let path = tmp.path().join(&cfg.storage_name);
    std::fs::write(&path, "Company,Address,Complement,Phone\nold,,,\n").unwrap();
    assert!(reg.remove("zona").unwrap());

    let again = reg.create("Zona").unwrap().expect("recreated");
    assert_eq!(again.storage_name, cfg.storage_name);
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.trim_end(), "Company,Address,Complement,Phone");

    let orphans: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("coleta_zona.csv.orphan-"))
        .collect();
    assert_eq!(orphans.len(), 1);
    let kept = std::fs::read_to_string(tmp.path().join(&orphans[0])).unwrap();
    assert!(kept.contains("old"));
}

#[test]
fn failed_file_init_leaves_route_unregistered() {
    let (tmp, reg) = registry();
    // A directory where the temp file would go makes the initial write fail.
    std::fs::create_dir_all(tmp.path().join("coleta_zona.csv.tmp")).unwrap();
    assert!(reg.create("Zona").is_err());
    assert!(reg.get("zona").unwrap().is_none());
    assert!(!tmp.path().join("coleta_zona.csv").exists());
}
