// ABOUTME: BDD context registry: feature/scenario stacks and step results

use std::sync::{Mutex, OnceLock};

#[derive(Debug, Clone)]
pub struct Step {
    pub keyword: String,
    pub description: String,
    pub status: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub description: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct Feature {
    pub description: String,
    pub scenarios: Vec<Scenario>,
}

#[derive(Default)]
struct Registry {
    feature_stack: Vec<Feature>,
    scenario_stack: Vec<Scenario>,
    results: Vec<Feature>,
}

fn registry() -> &'static Mutex<Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Registry::default()))
}

/// `describe` pushes a new feature. Nested `describe` is not supported as
/// nested features: a `describe` inside another `describe`'s body still
/// pushes (and later pops) a sibling top-level feature, since `end_feature`
/// always moves the popped feature straight into `results`. This mirrors a
/// documented limitation rather than an oversight.
pub fn start_feature(description: String) {
    registry().lock().expect("bdd registry poisoned").feature_stack.push(Feature {
        description,
        scenarios: Vec::new(),
    });
}

pub fn end_feature() {
    let mut reg = registry().lock().expect("bdd registry poisoned");
    if let Some(feature) = reg.feature_stack.pop() {
        reg.results.push(feature);
    }
}

pub fn start_scenario(description: String) {
    registry().lock().expect("bdd registry poisoned").scenario_stack.push(Scenario {
        description,
        steps: Vec::new(),
    });
}

pub fn end_scenario() {
    let mut reg = registry().lock().expect("bdd registry poisoned");
    if let Some(scenario) = reg.scenario_stack.pop() {
        if let Some(feature) = reg.feature_stack.last_mut() {
            feature.scenarios.push(scenario);
        }
    }
}

pub fn add_step(keyword: &str, description: String) {
    let mut reg = registry().lock().expect("bdd registry poisoned");
    if let Some(scenario) = reg.scenario_stack.last_mut() {
        scenario.steps.push(Step {
            keyword: keyword.to_string(),
            description,
            status: "passed".to_string(),
            details: None,
        });
    }
}

pub fn mark_last_step_status(status: &str, details: Option<String>) {
    let mut reg = registry().lock().expect("bdd registry poisoned");
    if let Some(scenario) = reg.scenario_stack.last_mut() {
        if let Some(step) = scenario.steps.last_mut() {
            step.status = status.to_string();
            step.details = details;
        }
    }
}

pub fn is_feature_context_active() -> bool {
    !registry().lock().expect("bdd registry poisoned").feature_stack.is_empty()
}

pub fn is_scenario_context_active() -> bool {
    !registry().lock().expect("bdd registry poisoned").scenario_stack.is_empty()
}

pub fn results() -> Vec<Feature> {
    registry().lock().expect("bdd registry poisoned").results.clone()
}

#[cfg(test)]
pub fn reset_for_test() {
    let mut reg = registry().lock().expect("bdd registry poisoned");
    *reg = Registry::default();
}
