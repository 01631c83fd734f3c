use cloudhook_webhook::{
    ClassTarget, Cloud, CloudError, CloudObject, JsonCodec, TriggerKind, WebhookConfig, WebhookKey,
};
use pretty_assertions::assert_eq;

// ── Webhook key ─────────────────────────────────────────────────

#[test]
fn unset_key_is_refused() {
    let err = WebhookConfig::from_value(None).unwrap_err();
    assert!(matches!(err, CloudError::MissingWebhookKey));
}

#[test]
fn empty_key_is_refused() {
    let err = WebhookConfig::from_value(Some(String::new())).unwrap_err();
    assert!(matches!(err, CloudError::MissingWebhookKey));
    assert!(WebhookKey::new("").is_err());
}

#[test]
fn key_matches_exact_header_bytes() {
    let key = WebhookKey::new("s3cret").unwrap();
    assert!(key.matches(Some(b"s3cret")));
    assert!(!key.matches(Some(b"s3cret ")));
    assert!(!key.matches(Some(b"S3CRET")));
    assert!(!key.matches(Some(b"")));
    assert!(!key.matches(None));
}

#[test]
fn key_is_redacted_in_debug_output() {
    let config = WebhookConfig::from_value(Some("s3cret".into())).unwrap();
    let debug = format!("{config:?}");
    assert!(!debug.contains("s3cret"));
    assert!(debug.contains("redacted"));
}

// ── Cloud builder ───────────────────────────────────────────────

fn cloud() -> Cloud {
    Cloud::new(WebhookConfig::new(WebhookKey::new("k").unwrap())).unwrap()
}

#[test]
fn class_targets_resolve_to_class_names() {
    assert_eq!(ClassTarget::class_name("Widget"), "Widget");
    assert_eq!(ClassTarget::class_name(&String::from("Widget")), "Widget");
    let object = CloudObject::with_id("Widget", "w1");
    assert_eq!(ClassTarget::class_name(&object), "Widget");
    assert_eq!(ClassTarget::class_name(&&object), "Widget");
}

#[test]
fn every_registration_kind_lands_in_the_registry() {
    let mut cloud = cloud().with_codec(JsonCodec);
    cloud
        .define("hello", |ctx| async move { ctx.success("hi") })
        .unwrap()
        .before_save("Widget", |ctx| async move { ctx.success(()) })
        .unwrap()
        .after_save(String::from("Widget"), |_ctx| async {})
        .unwrap()
        .before_delete(CloudObject::new("Gadget"), |ctx| async move { ctx.success(()) })
        .unwrap()
        .after_delete("Gadget", |_ctx| async {})
        .unwrap();

    let registry = cloud.registry();
    assert_eq!(registry.function_count(), 1);
    assert_eq!(registry.trigger_count(), 4);
    assert!(registry.has_trigger("Widget", TriggerKind::AfterSave));
    assert!(registry.has_trigger("Gadget", TriggerKind::BeforeDelete));
    assert!(!registry.has_trigger("Gadget", TriggerKind::BeforeSave));
}

#[test]
fn invalid_names_are_rejected_at_registration() {
    let mut cloud = cloud();
    assert!(matches!(
        cloud.define("a/b", |_ctx| async {}),
        Err(CloudError::InvalidName { kind: "function", .. })
    ));
    assert!(matches!(
        cloud.before_save("", |_ctx| async {}),
        Err(CloudError::InvalidName { kind: "class", .. })
    ));
    assert_eq!(cloud.registry().function_count(), 0);
    assert_eq!(cloud.registry().trigger_count(), 0);
}

#[test]
fn jobs_are_accepted_but_not_registered() {
    let mut cloud = cloud();
    cloud.job("nightly", |ctx| async move { ctx.success(()) });
    assert_eq!(cloud.registry().function_count(), 0);
    assert_eq!(cloud.registry().trigger_count(), 0);
}
