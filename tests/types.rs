mod common;

use common::FakeApp;
use redfish_cli::cli::TypesOptions;
use redfish_cli::{types, CliError};
use serde_json::json;

fn service() -> FakeApp {
    let mut app = FakeApp::new();
    let resources = [
        (
            "/redfish/v1/",
            json!({
                "@odata.id": "/redfish/v1/",
                "@odata.type": "#ServiceRoot.v1_5_0.ServiceRoot",
                "Systems": {"@odata.id": "/redfish/v1/Systems/"},
                "JsonSchemas": {"@odata.id": "/redfish/v1/JsonSchemas/"}
            }),
        ),
        (
            "/redfish/v1/Systems/",
            json!({
                "@odata.id": "/redfish/v1/Systems/",
                "@odata.type": "#ComputerSystemCollection.ComputerSystemCollection",
                "Members": [{"@odata.id": "/redfish/v1/Systems/1/"}]
            }),
        ),
        (
            "/redfish/v1/Systems/1/",
            json!({
                "@odata.id": "/redfish/v1/Systems/1/",
                "@odata.type": "#ComputerSystem.v1_4_0.ComputerSystem",
                "Bios": {"@odata.id": "/redfish/v1/Systems/1/Bios/"},
                "LogServices": {"@odata.id": "/redfish/v1/Systems/1/LogServices/"},
                "Links": {"Chassis": [{"@odata.id": "/redfish/v1/Chassis/1"}]}
            }),
        ),
        (
            "/redfish/v1/Systems/1/Bios/",
            json!({"@odata.type": "#Bios.v1_0_0.Bios"}),
        ),
        (
            "/redfish/v1/Systems/1/LogServices/",
            json!({"@odata.type": "#LogServiceCollection.LogServiceCollection"}),
        ),
    ];
    for (path, doc) in resources {
        app.resources.insert(path.to_string(), doc);
    }
    app
}

fn logged_in(include_logs: bool) -> TypesOptions {
    TypesOptions {
        url: Some("bmc.lab".to_string()),
        user: Some("admin".to_string()),
        password: Some("pw".to_string()),
        includelogs: include_logs,
        ..Default::default()
    }
}

#[test]
fn lists_simplified_types_and_skips_logs() {
    let mut app = service();
    let types = types::collect(&mut app, &logged_in(false)).unwrap();

    assert_eq!(
        types,
        vec![
            "Bios.v1_0_0",
            "ComputerSystem.v1_4_0",
            "ComputerSystemCollection.ComputerSystemCollection",
            "ServiceRoot.v1_5_0",
        ]
    );
    assert!(!app.gets.iter().any(|p| p.contains("LogServices")));
    assert!(!app.gets.iter().any(|p| p.contains("JsonSchemas")));
    // The chassis link fails to load and is skipped.
    assert!(app.gets.contains(&"/redfish/v1/Chassis/1".to_string()));

    let (args, skip_build) = &app.logins[0];
    assert!(!skip_build);
    assert!(!args.include_logs);
}

#[test]
fn include_logs_and_full_types() {
    let mut app = service();
    let mut options = logged_in(true);
    options.fulltypes = true;
    let types = types::collect(&mut app, &options).unwrap();

    assert!(types.contains(&"#LogServiceCollection.LogServiceCollection".to_string()));
    assert!(types.contains(&"#Bios.v1_0_0.Bios".to_string()));
    assert_eq!(
        app.logins[0].0.to_command_line(),
        vec!["bmc.lab", "-u", "admin", "-p", "pw", "--includelogs"]
    );
}

#[test]
fn starting_path_limits_the_crawl() {
    let mut app = service();
    let mut options = logged_in(false);
    options.path = Some("/redfish/v1/Systems/1/".to_string());
    let types = types::collect(&mut app, &options).unwrap();

    assert_eq!(app.gets[0], "/redfish/v1/Systems/1/");
    assert!(!types.contains(&"ServiceRoot.v1_5_0".to_string()));
    assert!(types.contains(&"Bios.v1_0_0".to_string()));
}

#[test]
fn output_format() {
    let mut app = service().with_session(Some("admin"), Some("pw"));
    app.session.as_mut().unwrap().starting_path = "/redfish/v1/Systems/1/Bios/".to_string();
    let mut out = Vec::new();
    types::run(&mut app, &TypesOptions::default(), &mut out).unwrap();

    assert!(app.logins.is_empty());
    assert_eq!(String::from_utf8(out).unwrap(), "Type options:\nBios.v1_0_0\n");
}

#[test]
fn positional_arguments_rejected() {
    let mut app = service();
    let options = TypesOptions {
        args: vec!["extra".to_string()],
        ..Default::default()
    };
    let err = types::collect(&mut app, &options).unwrap_err();
    assert!(matches!(err, CliError::InvalidCommandLine(_)));
    assert_eq!(app.network_calls(), 0);
}
