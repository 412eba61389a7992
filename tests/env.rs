//! Integration tests for quill-env crate.

use quill_env::{EnvError, Environment, Identifier, Invocation, ObjectSource, SourcedValue};

fn character() -> ObjectSource<f64> {
    let mut source = ObjectSource::from_pairs(
        "character",
        [("st".to_string(), 12.0), ("dx".to_string(), 14.0)],
    )
    .unwrap();
    source.add_key("strength", SourcedValue::proxy("st")).unwrap();
    source
        .add_key(
            "sum",
            SourcedValue::function(|call: &Invocation<'_, f64>| Some(call.args.iter().sum())),
        )
        .unwrap();
    source
}

// ============================================================================
// Lookup Tests
// ============================================================================

#[test]
fn test_simple_values() {
    let mut env = Environment::new("sheet");
    env.add_source(character());
    assert_eq!(env.get("st").unwrap(), Some(12.0));
    assert_eq!(env.get("ht").unwrap(), None);
    assert!(!env.has("ht").unwrap());
}

#[test]
fn test_proxies_and_functions() {
    let mut env = Environment::new("sheet");
    env.add_source(character());
    assert_eq!(env.get("strength").unwrap(), Some(12.0));
    assert_eq!(env.call("sum", &[1.0, 2.0, 3.0]).unwrap(), Some(6.0));
    assert_eq!(
        env.associated_identifiers("strength").unwrap(),
        vec![Identifier::named("st")]
    );
}

#[test]
fn test_functions_can_decline() {
    let mut source = ObjectSource::new("lazy");
    source
        .add_key("later", SourcedValue::function(|_: &Invocation<'_, f64>| None))
        .unwrap();
    let mut env = Environment::new("sheet");
    env.add_source(source);
    assert!(env.has("later").unwrap());
    assert_eq!(env.get("later").unwrap(), None);
}

#[test]
fn test_pattern_entries() {
    let mut source = ObjectSource::new("skills");
    source
        .add_match(
            "skills",
            |id: &Identifier| id.name().starts_with("SK:"),
            SourcedValue::Simple(10.0),
        )
        .unwrap();
    let mut env = Environment::new("sheet");
    env.add_source(source);
    assert_eq!(env.get("SK:Stealth").unwrap(), Some(10.0));
    assert_eq!(env.get("Stealth").unwrap(), None);
}

// ============================================================================
// Chain Tests
// ============================================================================

#[test]
fn test_local_bindings_shadow_parent() {
    let mut parent = Environment::new("campaign");
    parent.add_source(character());
    let mut env = Environment::with_parent("scene", parent);
    env.define("st", 9.0).unwrap();
    assert_eq!(env.get("st").unwrap(), Some(9.0));
    assert_eq!(env.get("dx").unwrap(), Some(14.0));
    assert_eq!(env.parent().map(Environment::name), Some("campaign"));
}

#[test]
fn test_define_rejects_duplicates_and_set_overwrites() {
    let mut env: Environment<f64> = Environment::new("sheet");
    env.define("hp", 10.0).unwrap();
    assert!(matches!(
        env.define("hp", 11.0),
        Err(EnvError::DuplicateKey { key, .. }) if key == "hp"
    ));
    env.set("hp", SourcedValue::Simple(11.0));
    assert_eq!(env.get("hp").unwrap(), Some(11.0));
}

#[test]
fn test_fallbacks_lose_to_regular_entries() {
    let mut defaults = ObjectSource::new("defaults");
    defaults.add_fallback_key("st", SourcedValue::Simple(10.0)).unwrap();
    defaults.add_fallback_key("ht", SourcedValue::Simple(10.0)).unwrap();
    let mut env = Environment::new("sheet");
    env.add_source(defaults);
    env.add_source(character());
    assert_eq!(env.get("st").unwrap(), Some(12.0));
    assert_eq!(env.get("ht").unwrap(), Some(10.0));
}

#[test]
fn test_proxy_cycles_are_reported() {
    let mut env: Environment<f64> = Environment::new("sheet");
    env.set("a", SourcedValue::proxy("b"));
    env.set("b", SourcedValue::proxy("a"));
    assert!(matches!(env.get("a"), Err(EnvError::ProxyCycle { .. })));
    assert!(env.has("a").is_err());
}

#[test]
fn test_names_cover_the_chain() {
    let mut parent = Environment::new("campaign");
    parent.add_source(character());
    let mut env = Environment::with_parent("scene", parent);
    env.define("ht", 10.0).unwrap();
    assert_eq!(env.names(), vec!["dx", "ht", "st", "strength", "sum"]);
}
