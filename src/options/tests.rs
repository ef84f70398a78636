//! Option parsing and validation tests.

use super::*;
use rstest::{fixture, rstest};

#[fixture]
fn base_options() -> RawOptions {
    RawOptions::new()
        .with(HOST, "example.com")
        .with(USER, "user.name")
        .with(PASSWORD, "secret")
        .with(PATH, "foo")
}

#[rstest]
fn complete_options_validate_with_defaults(base_options: RawOptions) {
    let options = SyncOptions::from_raw(&base_options).expect("valid options");
    assert_eq!(options.endpoint().host, "example.com");
    assert_eq!(options.endpoint().port, DEFAULT_FTP_PORT);
    assert!(!options.endpoint().passive);
    assert_eq!(options.remote_path(), "foo");
    assert!(options.cleanup().is_none());
}

#[rstest]
#[case(HOST)]
#[case(USER)]
#[case(PASSWORD)]
#[case(PATH)]
fn blank_mandatory_options_are_missing(base_options: RawOptions, #[case] name: &str) {
    for blank in ["", "   "] {
        let raw = base_options.clone().with(name, blank);
        assert_eq!(
            SyncOptions::from_raw(&raw),
            Err(ConfigurationError::MissingOption {
                name: name.to_owned()
            })
        );
    }
}

#[test]
fn first_missing_option_is_reported() {
    let raw = RawOptions::new().with(PATH, "foo");
    let err = SyncOptions::from_raw(&raw).expect_err("nothing but path is set");
    assert_eq!(err.to_string(), "option 'host' is missing");
}

#[rstest]
#[case("/foo")]
#[case("\\foo")]
#[case("/")]
fn leading_separators_are_rejected(base_options: RawOptions, #[case] path: &str) {
    assert_eq!(
        SyncOptions::from_raw(&base_options.with(PATH, path)),
        Err(ConfigurationError::AbsolutePath)
    );
}

#[rstest]
fn absolute_path_is_reported_before_later_problems(base_options: RawOptions) {
    let raw = base_options
        .with(PATH, "/foo")
        .with(PORT, "not-a-port")
        .with("cleanup.type", "bogus");
    assert_eq!(
        SyncOptions::from_raw(&raw),
        Err(ConfigurationError::AbsolutePath)
    );
}

#[rstest]
#[case("foo\r\nRMD keep")]
#[case("foo\nbar")]
#[case("foo\u{0}")]
fn control_characters_in_path_are_rejected(base_options: RawOptions, #[case] path: &str) {
    let err = SyncOptions::from_raw(&base_options.with(PATH, path))
        .expect_err("path with control characters should fail");
    assert!(
        matches!(&err, ConfigurationError::InvalidValue { name, .. } if name == PATH),
        "{err}"
    );
}

#[rstest]
fn user_names_cannot_contain_the_credential_separator(base_options: RawOptions) {
    let err = SyncOptions::from_raw(&base_options.with(USER, "ops:admin"))
        .expect_err("user with ':' should fail");
    assert!(
        matches!(&err, ConfigurationError::InvalidValue { name, .. } if name == USER),
        "{err}"
    );
}

#[rstest]
fn contains_reports_present_keys(base_options: RawOptions) {
    assert!(base_options.contains(HOST));
    assert!(!base_options.contains(PORT));
}

#[rstest]
fn trailing_separators_are_stripped(base_options: RawOptions) {
    let options = SyncOptions::from_raw(&base_options.with(PATH, "backups/daily//"))
        .expect("valid options");
    assert_eq!(options.remote_path(), "backups/daily");
}

#[rstest]
#[case(OptionValue::Integer(2121), Some(2121))]
#[case(OptionValue::Text(String::from("990")), Some(990))]
#[case(OptionValue::Integer(0), None)]
#[case(OptionValue::Integer(70_000), None)]
#[case(OptionValue::Bool(true), None)]
fn ports_must_fit_a_tcp_port(
    base_options: RawOptions,
    #[case] value: OptionValue,
    #[case] expected: Option<u16>,
) {
    let result = SyncOptions::from_raw(&base_options.with(PORT, value));
    match expected {
        Some(port) => assert_eq!(result.expect("valid port").endpoint().port, port),
        None => assert!(
            matches!(result, Err(ConfigurationError::InvalidValue { ref name, .. }) if name == PORT),
            "{result:?}"
        ),
    }
}

#[rstest]
#[case(OptionValue::Bool(true), true)]
#[case(OptionValue::Text(String::from("yes")), true)]
#[case(OptionValue::Text(String::from("OFF")), false)]
#[case(OptionValue::Integer(1), true)]
fn passive_accepts_boolean_spellings(
    base_options: RawOptions,
    #[case] value: OptionValue,
    #[case] expected: bool,
) {
    let options = SyncOptions::from_raw(&base_options.with(PASSIVE, value)).expect("valid");
    assert_eq!(options.endpoint().passive, expected);
}

#[rstest]
fn unknown_keys_are_ignored(base_options: RawOptions) {
    let raw = base_options.with("encryption", "aes").with("retries", 3_i64);
    assert!(SyncOptions::from_raw(&raw).is_ok());
}

#[rstest]
fn cleanup_rule_is_attached(base_options: RawOptions) {
    let raw = base_options
        .with("cleanup.type", "quantity")
        .with("cleanup.amount", 99_i64);
    let options = SyncOptions::from_raw(&raw).expect("valid options");
    assert_eq!(
        options.cleanup(),
        Some(&crate::cleanup::CleanupRule::Quantity { keep: 99 })
    );
}

#[test]
fn json_documents_deserialise_mixed_values() {
    let raw = RawOptions::from_json(
        r#"{"host":"example.com","user":"u","password":"p","path":"foo","cleanup.amount":99,"passive":true}"#,
    )
    .expect("valid json");
    assert_eq!(raw.get("cleanup.amount"), Some(&OptionValue::Integer(99)));
    assert_eq!(raw.get(PASSIVE), Some(&OptionValue::Bool(true)));
    assert!(SyncOptions::from_raw(&raw).is_ok());
}

#[test]
fn malformed_json_is_reported() {
    let err = RawOptions::from_json("[1, 2]").expect_err("arrays are not options");
    assert!(matches!(err, ConfigurationError::Malformed { .. }));
}

#[rstest]
fn debug_output_redacts_passwords(base_options: RawOptions) {
    let rendered = format!("{base_options:?}");
    assert!(!rendered.contains("secret"), "{rendered}");

    let options = SyncOptions::from_raw(&base_options).expect("valid options");
    let rendered_options = format!("{options:?}");
    assert!(!rendered_options.contains("secret"), "{rendered_options}");
}
