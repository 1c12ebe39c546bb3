//! Scenario fixtures
//!
//! A scenario is one input document, the devices it is solved against, the
//! product it uses (by name, from `resources/products`) and what the result
//! must look like.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use storage_contracts::SolveErrorKind;
use storage_solver::Rule;
use storage_types::{Device, Inventory, ProductDefaults};

use crate::errors::{Result, TestingError};

const SCENARIOS_DIR: &str = "resources/scenarios";
const PRODUCTS_DIR: &str = "resources/products";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub product: String,
    #[serde(default)]
    pub format: InputFormat,
    /// Input document, as JSON text
    pub input: String,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub expect: Expectation,
}

/// Shape of the input document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Json,
    Model,
}

/// What a scenario must produce; unset fields are not checked
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Expectation {
    /// Solved configuration, as wire JSON text
    pub solved: Option<String>,
    /// Model of the solved configuration, as JSON text; missing keys take
    /// the model defaults
    pub model: Option<String>,
    pub supported: Option<bool>,
    /// Rules the support checker reports, in any order
    pub violations: Option<Vec<Rule>>,
    /// The solver fails with this kind of error
    pub error: Option<SolveErrorKind>,
    /// Decoding fails at this document path
    pub schema_error: Option<String>,
}

impl Expectation {
    pub fn expects_failure(&self) -> bool {
        self.error.is_some() || self.schema_error.is_some()
    }

    fn checks_result(&self) -> bool {
        self.solved.is_some()
            || self.model.is_some()
            || self.supported.is_some()
            || self.violations.is_some()
    }
}

impl Scenario {
    /// Parsed input document
    pub fn document(&self) -> Result<Value> {
        serde_json::from_str(&self.input).map_err(|error| self.invalid(format!("input: {error}")))
    }

    pub fn inventory(&self) -> Result<Inventory> {
        let inventory = Inventory::new(self.devices.clone());
        inventory
            .validate()
            .map_err(|error| self.invalid(error.to_string()))?;
        Ok(inventory)
    }

    fn invalid(&self, reason: impl Into<String>) -> TestingError {
        TestingError::ScenarioInvalid {
            scenario_name: self.name.clone(),
            reason: reason.into(),
        }
    }
}

pub fn workspace_root() -> PathBuf {
    if let Ok(value) = std::env::var("STORAGE_TESTING_WORKSPACE_ROOT") {
        return PathBuf::from(value);
    }

    if let Ok(current_dir) = std::env::current_dir()
        && current_dir.join(SCENARIOS_DIR).exists()
    {
        return current_dir;
    }

    let manifest_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    if manifest_root.join(SCENARIOS_DIR).exists() {
        return manifest_root;
    }

    PathBuf::from(".")
}

pub fn scenarios_root() -> PathBuf {
    workspace_root().join(SCENARIOS_DIR)
}

pub fn products_root() -> PathBuf {
    workspace_root().join(PRODUCTS_DIR)
}

pub fn scenario_path_for_name(scenario_name: &str) -> PathBuf {
    scenarios_root().join(format!("{scenario_name}.toml"))
}

pub fn product_path_for_name(product_name: &str) -> PathBuf {
    products_root().join(format!("{product_name}.toml"))
}

/// Names of every scenario, sorted
pub fn list_names() -> Result<Vec<String>> {
    let root = scenarios_root();
    let entries = fs::read_dir(&root).map_err(|error| TestingError::ResourcesIo {
        path: root.clone(),
        reason: error.to_string(),
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| TestingError::ResourcesIo {
            path: root.clone(),
            reason: error.to_string(),
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "toml")
            && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
        {
            names.push(stem.to_string());
        }
    }

    names.sort();
    Ok(names)
}

pub fn load_by_name(scenario_name: &str) -> Result<Scenario> {
    let path = scenario_path_for_name(scenario_name);
    if !path.exists() {
        return Err(TestingError::ScenarioNotFound {
            scenario_name: scenario_name.to_string(),
        });
    }

    let raw = fs::read_to_string(&path).map_err(|error| TestingError::ScenarioInvalid {
        scenario_name: scenario_name.to_string(),
        reason: error.to_string(),
    })?;

    let scenario: Scenario = toml::from_str(&raw).map_err(|error| TestingError::ScenarioInvalid {
        scenario_name: scenario_name.to_string(),
        reason: error.to_string(),
    })?;

    if scenario.name != scenario_name {
        return Err(TestingError::ScenarioInvalid {
            scenario_name: scenario_name.to_string(),
            reason: format!("file declares name '{}'", scenario.name),
        });
    }

    validate(&scenario)?;
    Ok(scenario)
}

pub fn load_product(product_name: &str) -> Result<ProductDefaults> {
    let path = product_path_for_name(product_name);
    if !path.exists() {
        return Err(TestingError::ProductNotFound {
            product_name: product_name.to_string(),
        });
    }

    let raw = fs::read_to_string(&path).map_err(|error| TestingError::ResourcesIo {
        path: path.clone(),
        reason: error.to_string(),
    })?;

    ProductDefaults::from_toml_str(&raw).map_err(|source| TestingError::ProductInvalid {
        product_name: product_name.to_string(),
        source,
    })
}

pub fn validate(scenario: &Scenario) -> Result<()> {
    if scenario.name.is_empty() {
        return Err(TestingError::ScenarioInvalid {
            scenario_name: "<unknown>".to_string(),
            reason: "name must not be empty".to_string(),
        });
    }

    if scenario.product.is_empty() {
        return Err(scenario.invalid("product must not be empty"));
    }

    if !scenario.document()?.is_object() {
        return Err(scenario.invalid("input must be a JSON object"));
    }

    let expect = &scenario.expect;
    if expect.error.is_some() && expect.schema_error.is_some() {
        return Err(scenario.invalid("expect.error and expect.schema_error exclude each other"));
    }

    if expect.expects_failure() && expect.checks_result() {
        return Err(scenario.invalid("a failing scenario cannot expect a result"));
    }

    if !expect.expects_failure() && !expect.checks_result() {
        return Err(scenario.invalid("expect must check something"));
    }

    if let Some(solved) = &expect.solved {
        serde_json::from_str::<Value>(solved)
            .map_err(|error| scenario.invalid(format!("expect.solved: {error}")))?;
    }

    if let Some(model) = &expect.model {
        serde_json::from_str::<Value>(model)
            .map_err(|error| scenario.invalid(format!("expect.model: {error}")))?;
    }

    scenario.inventory()?;
    Ok(())
}
