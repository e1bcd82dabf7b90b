//! End-to-end tests: declarations on disk through load, actions and execution.

mod helpers;

use std::path::PathBuf;

use helpers::{cts_launcher, generate, read, TestEnv, BUILD_NUMBER};
use regex::Regex;
use serde_json::json;
use suite_harness::android::{executor, ninja, BuildError, LoadError};
use suite_harness::java::BinaryHost;
use suite_harness::tradefed::{TradefedBinaryGen, REQUIRED_LIBS};

const SUITE_INFO_SHAPE: &str =
    r"^# .*\nbuild_number = .*\ntarget_arch = .*\nname = .*\nfullname = .*\nversion = .*\n$";

#[test]
fn test_launcher_expands_into_generator() {
    let env = TestEnv::new();
    env.write_blueprint("cts/tools", json!([cts_launcher()]));

    let (ctx, graph) = generate(env.config());

    let names: Vec<_> = ctx.module_names().collect();
    assert_eq!(names, vec!["cts-tradefed", "cts-tradefed-gen"]);

    let gen_info = ctx.module("cts-tradefed-gen").unwrap();
    assert_eq!(gen_info.created_by.as_deref(), Some("cts-tradefed"));
    assert_eq!(gen_info.type_name, None);
    assert_eq!(gen_info.dir, PathBuf::from("cts/tools"));

    let host = ctx
        .module("cts-tradefed")
        .unwrap()
        .module
        .downcast_ref::<BinaryHost>()
        .unwrap();
    assert_eq!(host.properties().libs, REQUIRED_LIBS);
    assert_eq!(host.properties().java_resources, vec![":cts-tradefed-gen"]);

    let gen = ctx
        .module("cts-tradefed-gen")
        .unwrap()
        .module
        .downcast_ref::<TradefedBinaryGen>()
        .unwrap();
    assert_eq!(gen.properties().version, "11_r3");

    let properties = env.out_path("cts-tradefed-gen/test-suite-info.properties");
    let edge = graph.producer_of(&properties).unwrap();
    assert_eq!(edge.rule.name, "tradefedBinaryGenRule");
    assert_eq!(edge.order_only, vec![env.build_number_file.clone()]);
    assert!(edge.inputs.is_empty());

    // The launcher stages the generated file as a resource.
    let staged = env.out_path("cts-tradefed/res/test-suite-info.properties");
    assert_eq!(graph.producer_of(&staged).unwrap().inputs, vec![properties]);
}

#[test]
fn test_build_writes_properties_file() {
    let env = TestEnv::new();
    env.write_blueprint("cts/tools", json!([cts_launcher()]));

    let (ctx, graph) = generate(env.config());
    executor::execute(&graph, ctx.config()).unwrap();

    let content = read(&env.out_path("cts-tradefed-gen/test-suite-info.properties"));
    assert!(Regex::new(SUITE_INFO_SHAPE).unwrap().is_match(&content));
    let lines: Vec<_> = content.lines().skip(1).collect();
    assert_eq!(
        lines,
        vec![
            format!("build_number = {}", BUILD_NUMBER),
            "target_arch = arm64".to_string(),
            "name = cts".to_string(),
            "fullname = Compat Test Suite".to_string(),
            "version = 11_r3".to_string(),
        ]
    );
    assert_eq!(
        read(&env.out_path("cts-tradefed/res/test-suite-info.properties")),
        content
    );
}

#[test]
fn test_platform_version_prepended() {
    let env = TestEnv::new();
    let mut launcher = cts_launcher();
    launcher["version"] = json!("_r3");
    launcher["prepend_platform_version"] = json!(true);
    env.write_blueprint("cts/tools", json!([launcher]));

    let (ctx, graph) = generate(env.config());
    executor::execute(&graph, ctx.config()).unwrap();

    let content = read(&env.out_path("cts-tradefed-gen/test-suite-info.properties"));
    assert!(content.ends_with("version = 12_r3\n"));
}

#[test]
fn test_dynamic_config_copied_and_staged() {
    let env = TestEnv::new();
    env.write_blueprint("cts/tools", json!([cts_launcher()]));
    env.write_source("cts/tools/DynamicConfig.xml", "<dynamicConfig/>\n");

    let (ctx, graph) = generate(env.config());

    let gen = ctx
        .module("cts-tradefed-gen")
        .unwrap()
        .module
        .downcast_ref::<TradefedBinaryGen>()
        .unwrap();
    let dynamic = env.out_path("cts-tradefed-gen/cts-tradefed.dynamic");
    assert_eq!(gen.properties().short_name, "cts");
    assert_eq!(graph.edges_for_module("cts-tradefed-gen").count(), 2);
    assert_eq!(
        graph.producer_of(&dynamic).unwrap().inputs,
        vec![env.src.join("cts/tools/DynamicConfig.xml")]
    );

    executor::execute(&graph, ctx.config()).unwrap();
    assert_eq!(read(&dynamic), "<dynamicConfig/>\n");
    assert_eq!(
        read(&env.out_path("cts-tradefed/res/cts-tradefed.dynamic")),
        "<dynamicConfig/>\n"
    );
}

#[test]
fn test_no_dynamic_config_single_output() {
    let env = TestEnv::new();
    env.write_blueprint("cts/tools", json!([cts_launcher()]));
    // A DynamicConfig.xml elsewhere in the tree is not picked up.
    env.write_source("other/DynamicConfig.xml", "<dynamicConfig/>\n");

    let (_ctx, graph) = generate(env.config());
    assert_eq!(graph.edges_for_module("cts-tradefed-gen").count(), 1);
}

#[test]
fn test_missing_launcher_field_abandons_only_that_declaration() {
    let env = TestEnv::new();
    let mut broken = cts_launcher();
    broken["name"] = json!("gts-tradefed");
    broken.as_object_mut().unwrap().remove("full_name");
    env.write_blueprint("cts/tools", json!([broken, cts_launcher()]));

    let err = suite_harness::load_context(env.config()).unwrap_err();
    let load = err.downcast_ref::<LoadError>().unwrap();
    assert_eq!(load.errors.len(), 1);
    assert_eq!(load.errors[0].module, "gts-tradefed");
    assert!(matches!(
        load.errors[0].build_error(),
        Some(BuildError::MissingProperty("full_name"))
    ));
}

#[test]
fn test_declared_gen_name_collides_with_generator() {
    let env = TestEnv::new();
    env.write_blueprint(
        "cts/tools",
        json!([
            cts_launcher(),
            {"type": "java_binary_host", "name": "cts-tradefed-gen"},
        ]),
    );

    let err = suite_harness::load_context(env.config()).unwrap_err();
    let load = err.downcast_ref::<LoadError>().unwrap();
    assert_eq!(load.errors.len(), 1);
    assert_eq!(load.errors[0].module, "cts-tradefed-gen");
    assert!(matches!(
        load.errors[0].build_error(),
        Some(BuildError::DuplicateModule { name, created_by: Some(parent) })
            if name == "cts-tradefed-gen" && parent == "cts-tradefed"
    ));
    assert!(err.to_string().contains("created by \"cts-tradefed\""));
}

#[test]
fn test_earlier_gen_declaration_abandons_launcher() {
    let env = TestEnv::new();
    env.write_blueprint(
        "a",
        json!([{"type": "java_binary_host", "name": "cts-tradefed-gen"}]),
    );
    env.write_blueprint("b", json!([cts_launcher()]));

    let err = suite_harness::load_context(env.config()).unwrap_err();
    let load = err.downcast_ref::<LoadError>().unwrap();
    assert_eq!(load.errors.len(), 1);
    assert_eq!(load.errors[0].module, "cts-tradefed");
    assert!(matches!(
        load.errors[0].build_error(),
        Some(BuildError::DuplicateModule { name, created_by: None }) if name == "cts-tradefed-gen"
    ));

    let registry = suite_harness::android::default_registry().unwrap();
    let declarations = suite_harness::android::blueprint::discover(&env.src).unwrap();
    let mut ctx = suite_harness::android::Context::new(env.config());
    assert!(ctx.load(&registry, declarations).is_err());
    assert!(ctx.module("cts-tradefed").is_none());
    assert_eq!(ctx.module_names().collect::<Vec<_>>(), vec!["cts-tradefed-gen"]);
}

#[test]
fn test_build_number_change_reruns_only_dependents() {
    let env = TestEnv::new();
    env.write_blueprint("cts/tools", json!([cts_launcher()]));
    let properties = env.out_path("cts-tradefed-gen/test-suite-info.properties");
    let staged = env.out_path("cts-tradefed/res/test-suite-info.properties");

    let (ctx, graph) = generate(env.config());
    let first = executor::execute(&graph, ctx.config()).unwrap();
    assert!(first.was_rebuilt(&properties));
    assert!(first.was_rebuilt(&staged));

    // Same bytes: nothing to do.
    env.set_build_number(BUILD_NUMBER);
    let second = executor::execute(&graph, ctx.config()).unwrap();
    assert!(second.ran.is_empty());

    env.set_build_number("5678");
    let third = executor::execute(&graph, ctx.config()).unwrap();
    assert!(third.was_rebuilt(&properties));
    assert!(third.was_rebuilt(&staged));
    assert!(read(&staged).contains("build_number = 5678\n"));
}

#[test]
fn test_missing_build_number_file_fails_action_phase() {
    let env = TestEnv::new();
    env.write_blueprint("cts/tools", json!([cts_launcher()]));
    let mut config = env.config();
    config.build_number_file = None;

    let mut ctx = suite_harness::load_context(config).unwrap();
    let err = ctx.generate_build_actions().unwrap_err();
    assert!(format!("{:#}", err).contains("BUILD_NUMBER_FILE is not configured"));
    assert!(format!("{:#}", err).contains("cts-tradefed-gen"));
}

#[test]
fn test_missing_libs_rejected_unless_allowed() {
    let env = TestEnv::new();
    env.write_blueprint("cts/tools", json!([cts_launcher()]));
    let mut config = env.config();
    config.allow_missing_dependencies = false;

    let err = suite_harness::load_context(config).unwrap_err();
    let load = err.downcast_ref::<LoadError>().unwrap();
    assert_eq!(load.errors.len(), REQUIRED_LIBS.len());
    assert!(load
        .errors
        .iter()
        .all(|e| e.module == "cts-tradefed"
            && matches!(e.build_error(), Some(BuildError::MissingDependency(_)))));
}

#[test]
fn test_libs_satisfied_by_declared_modules() {
    let env = TestEnv::new();
    let libs: Vec<_> = REQUIRED_LIBS
        .iter()
        .map(|lib| json!({"type": "java_binary_host", "name": lib}))
        .collect();
    env.write_blueprint("tools/tradefed", json!(libs));
    env.write_blueprint("cts/tools", json!([cts_launcher()]));
    let mut config = env.config();
    config.allow_missing_dependencies = false;

    let (ctx, _graph) = generate(config);
    assert_eq!(ctx.modules().count(), REQUIRED_LIBS.len() + 2);
}

#[test]
fn test_two_launchers_get_distinct_generators() {
    let env = TestEnv::new();
    let mut gts = cts_launcher();
    gts["name"] = json!("gts-tradefed");
    gts["short_name"] = json!("gts");
    env.write_blueprint("cts/tools", json!([cts_launcher()]));
    env.write_blueprint("gts/tools", json!([gts]));
    env.write_source("gts/tools/DynamicConfig.xml", "<gts/>\n");

    let (ctx, graph) = generate(env.config());
    executor::execute(&graph, ctx.config()).unwrap();

    assert!(read(&env.out_path("gts-tradefed-gen/test-suite-info.properties"))
        .contains("name = gts\n"));
    assert!(env.out_path("gts-tradefed-gen/gts-tradefed.dynamic").exists());
    assert!(!env.out_path("cts-tradefed-gen/cts-tradefed.dynamic").exists());
}

#[test]
fn test_generation_is_deterministic() {
    let env = TestEnv::new();
    env.write_source("cts/tools/DynamicConfig.xml", "<dynamicConfig/>\n");
    env.write_blueprint("cts/tools", json!([cts_launcher()]));

    let (mut ctx, graph) = generate(env.config());
    let again = ctx.generate_build_actions().unwrap();
    assert_eq!(graph, again);

    let (_ctx, fresh) = generate(env.config());
    assert_eq!(ninja::write_ninja(&graph), ninja::write_ninja(&fresh));
}

#[test]
fn test_manifest_declares_order_only_build_number() {
    let env = TestEnv::new();
    env.write_blueprint("cts/tools", json!([cts_launcher()]));

    let (_ctx, graph) = generate(env.config());
    let manifest = ninja::write_ninja(&graph);

    assert!(manifest.contains("rule tradefedBinaryGenRule\n"));
    assert!(manifest.contains(&format!(
        "build {}: tradefedBinaryGenRule || {}\n",
        env.out_path("cts-tradefed-gen/test-suite-info.properties")
            .display(),
        env.build_number_file.display()
    )));
    assert!(manifest.contains("    fullname = Compat Test Suite\n"));
}

#[test]
fn test_plain_resources_staged_from_module_dir() {
    let env = TestEnv::new();
    env.write_source("tools/res/config.xml", "<config/>\n");
    env.write_blueprint(
        "tools",
        json!([{"type": "java_binary_host", "name": "runner", "java_resources": ["res/config.xml"]}]),
    );

    let (ctx, graph) = generate(env.config());
    executor::execute(&graph, ctx.config()).unwrap();
    assert_eq!(read(&env.out_path("runner/res/config.xml")), "<config/>\n");
}

#[test]
fn test_missing_plain_resource_fails_action_phase() {
    let env = TestEnv::new();
    env.write_blueprint(
        "tools",
        json!([{"type": "java_binary_host", "name": "runner", "java_resources": ["res/absent.xml"]}]),
    );

    let mut ctx = suite_harness::load_context(env.config()).unwrap();
    let err = ctx.generate_build_actions().unwrap_err();
    assert!(format!("{:#}", err).contains("res/absent.xml does not exist"));
}
