// SPDX-License-Identifier: GPL-3.0-only

//! Decode, solve and describe a document, then compare against a scenario

use serde_json::Value;
use storage_codec::json::generate;
use storage_codec::{DecodeOptions, ModelConfig, from_json, from_model, to_json, to_model};
use storage_solver::{ConfigSolver, ModelSupportChecker, SupportReport};
use storage_types::{Config, Inventory, ProductDefaults};
use tracing::{debug, info};

use crate::errors::{Result, TestingError};
use crate::scenario::{self, InputFormat, Scenario};

/// Everything produced for one input document
#[derive(Debug, Clone)]
pub struct Resolution {
    pub solved: Config,
    /// Solved configuration as wire JSON
    pub document: Value,
    pub report: SupportReport,
    pub model: ModelConfig,
}

pub fn resolve(
    doc: &Value,
    format: InputFormat,
    inventory: &Inventory,
    product: &ProductDefaults,
) -> Result<Resolution> {
    let config = match format {
        InputFormat::Json => from_json(&generate::expand(doc, product)?, &DecodeOptions::default())?,
        InputFormat::Model => from_model(doc, product)?,
    };

    let solved = ConfigSolver::new(inventory, product).solve(&config)?;
    let report = ModelSupportChecker::new(product).check(&solved);
    let model = to_model(&solved, product, inventory);

    debug!(
        supported = report.is_supported(),
        violations = report.violations.len(),
        "Document resolved"
    );

    Ok(Resolution {
        document: to_json(&solved),
        solved,
        report,
        model,
    })
}

pub fn run(scenario: &Scenario) -> Result<Resolution> {
    let product = scenario::load_product(&scenario.product)?;
    resolve(
        &scenario.document()?,
        scenario.format,
        &scenario.inventory()?,
        &product,
    )
}

/// Run a scenario and compare the outcome with its expectations
pub fn check(scenario: &Scenario) -> Result<()> {
    let expect = &scenario.expect;
    let fail = |reason: String| TestingError::Expectation {
        scenario_name: scenario.name.clone(),
        reason,
    };

    let resolution = match (run(scenario), &expect.schema_error, expect.error) {
        (Err(TestingError::Schema(error)), Some(path), _) if error.path == *path => {
            info!(scenario = %scenario.name, "Scenario passed");
            return Ok(());
        }
        (Err(TestingError::Solve(error)), None, Some(kind)) if error.kind() == kind => {
            info!(scenario = %scenario.name, "Scenario passed");
            return Ok(());
        }
        (Ok(_), Some(path), _) => {
            return Err(fail(format!("expected a schema error at {path}, decoding succeeded")));
        }
        (Ok(_), None, Some(kind)) => {
            return Err(fail(format!("expected a {kind:?} error, solving succeeded")));
        }
        (Err(error), Some(_), _) | (Err(error), None, Some(_)) => {
            return Err(fail(format!("failed the wrong way: {error}")));
        }
        (result, None, None) => result?,
    };

    if let Some(solved) = &expect.solved {
        let expected: Value = serde_json::from_str(solved)?;
        if resolution.document != expected {
            return Err(fail(format!(
                "solved config differs\nexpected: {expected}\n  actual: {}",
                resolution.document
            )));
        }
    }

    if let Some(model) = &expect.model {
        let expected = ModelConfig::from_json(&serde_json::from_str(model)?)?;
        if resolution.model != expected {
            return Err(fail(format!(
                "model differs\nexpected: {}\n  actual: {}",
                expected.to_json()?,
                resolution.model.to_json()?
            )));
        }
    }

    if let Some(supported) = expect.supported
        && resolution.report.is_supported() != supported
    {
        return Err(fail(format!(
            "expected supported = {supported}, violations: {:?}",
            resolution.report.violations
        )));
    }

    if let Some(rules) = &expect.violations {
        let mut expected: Vec<String> = rules.iter().map(|rule| format!("{rule:?}")).collect();
        let mut actual: Vec<String> = resolution
            .report
            .violations
            .iter()
            .map(|violation| format!("{:?}", violation.rule))
            .collect();
        expected.sort();
        actual.sort();

        if expected != actual {
            return Err(fail(format!(
                "violations differ: expected {expected:?}, got {actual:?}"
            )));
        }
    }

    info!(scenario = %scenario.name, "Scenario passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storage_types::{Device, DeviceKind, GIB};

    fn inventory() -> Inventory {
        Inventory::new(vec![Device {
            name: "/dev/vda".to_string(),
            kind: DeviceKind::Disk,
            size: 20 * GIB,
            partition_table: None,
            parent: None,
            number: None,
            filesystem: None,
        }])
    }

    #[test]
    fn json_input_expands_generate_entries() {
        let product = ProductDefaults {
            default_paths: vec!["/".to_string(), "/home".to_string()],
            ..ProductDefaults::default()
        };
        let doc = json!({ "drives": [{ "partitions": [{ "generate": "default" }] }] });

        let resolution = resolve(&doc, InputFormat::Json, &inventory(), &product).unwrap();
        let paths: Vec<Option<&str>> = resolution.solved.drives[0]
            .partitions
            .iter()
            .map(|p| p.mount_path())
            .collect();

        assert_eq!(paths, [Some("/"), Some("/home")]);
        assert!(resolution.report.is_supported());
    }

    #[test]
    fn model_input_goes_through_the_model_codec() {
        let doc = json!({ "drives": [{ "name": "/dev/vda", "partitions": [{ "mountPath": "/" }] }] });

        let resolution =
            resolve(&doc, InputFormat::Model, &inventory(), &ProductDefaults::default()).unwrap();

        assert_eq!(resolution.solved.drives[0].device_name(), Some("/dev/vda"));
        assert_eq!(resolution.model.drives[0].name.as_deref(), Some("/dev/vda"));
    }

    #[test]
    fn decoding_errors_surface_as_schema_errors() {
        let doc = json!({ "drives": [{ "partitions": [{ "size": { "max": "1 GiB" } }] }] });

        let error = resolve(&doc, InputFormat::Json, &inventory(), &ProductDefaults::default())
            .unwrap_err();
        assert!(matches!(
            error,
            TestingError::Schema(ref schema) if schema.path == "drives[0].partitions[0].size.min"
        ));
    }

    #[test]
    fn unknown_generate_value_is_a_schema_error() {
        let doc = json!({ "drives": [{ "partitions": [{ "generate": "everything" }] }] });

        let error = resolve(&doc, InputFormat::Json, &inventory(), &ProductDefaults::default())
            .unwrap_err();
        assert!(matches!(
            error,
            TestingError::Schema(ref schema) if schema.path == "drives[0].partitions[0].generate"
        ));
    }
}
