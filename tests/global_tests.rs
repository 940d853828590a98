// tests/global_tests.rs

mod common;

use common::TestInstance;
use gitea_settings::config::global;

#[test]
fn test_global_settings_initialized_once() {
    assert!(global::get().is_none());

    let instance = TestInstance::with_config("APP_NAME = Once\n\n[security]\nINTERNAL_TOKEN = t\n");
    let published = global::init(instance.load_core().unwrap()).unwrap();
    assert_eq!(published.app_name, "Once");
    assert_eq!(global::get().map(|s| s.app_name.as_str()), Some("Once"));

    let again = instance.load_core().unwrap();
    assert!(global::init(again).is_err());
    assert_eq!(global::get().unwrap().app_name, "Once");
}
