//! Factory production planning via linear programming.
//!
//! The engine answers one question: can the factory sustain the requested
//! steady-state output rate of the target item, and if so, what plan does it
//! with the fewest machines? Crafting rates are the decision variables; one
//! extra variable per machine type tracks how many machines that type needs,
//! tied to the crafting rates by an accounting equality. Cycles in the
//! recipe graph need no special handling: the steady-state balance rows
//! close them. Byproducts carry no balance row at all and simply accumulate.
//!
//! When the primary solve is infeasible, a second solve drops the target
//! equality and maximizes the achievable rate instead, then reads the slack
//! of every capacity row at that optimum to name the bottlenecks.

use std::collections::BTreeSet;

use good_lp::variable::ProblemVariables;
use good_lp::{
    constraint, default_solver, variable, variables, Expression, ResolutionError, Solution,
    SolverModel, Variable,
};
use tracing::debug;

use crate::error::{SolverError, SolverResult};
use crate::models::{FactoryInput, FactoryOutput, Recipe};
use crate::{clamp_small_negative, TOLERANCE};

/// Slack threshold below which a capacity row counts as binding. Looser than
/// the comparison tolerance because simplex round-off on active rows can
/// exceed it.
const BINDING_SLACK: f64 = 1e-6;

/// Solve the minimum-machine production plan for the requested target rate.
pub fn solve_factory(input: &FactoryInput) -> SolverResult<FactoryOutput> {
    validate(input)?;

    let model = PlanModel::new(input);
    debug!(
        recipes = input.recipes.len(),
        machine_types = model.machine_types.len(),
        balanced_items = model.balance_items.len(),
        target = %input.target.item,
        "assembled factory model"
    );

    if !model.target_in_model() {
        return Ok(FactoryOutput::Infeasible {
            reason: format!("no enabled recipe produces {}", input.target.item),
            max_rate: 0.0,
            bottlenecks: Vec::new(),
        });
    }

    match model.minimize_machines()? {
        Some(plan) => Ok(model.report(&plan)),
        None => model.diagnose(),
    }
}

/// Net contribution of one craft of `recipe` to `item`: productivity-scaled
/// output minus input.
fn net_coefficient(recipe: &Recipe, item: &str) -> f64 {
    let produced =
        recipe.outputs.get(item).copied().unwrap_or(0.0) * recipe.productivity_multiplier;
    let consumed = recipe.inputs.get(item).copied().unwrap_or(0.0);
    produced - consumed
}

struct PlanModel<'a> {
    input: &'a FactoryInput,
    /// Machine types named by the caps map or referenced by recipes, sorted.
    machine_types: Vec<String>,
    /// Raw items referenced by at least one recipe, sorted. Unreferenced
    /// supplies constrain nothing.
    raw_items: Vec<String>,
    /// Non-raw, non-target items that some recipe consumes; each holds a
    /// zero-balance row. Items only ever produced are byproducts and get no
    /// row.
    balance_items: Vec<String>,
    /// Every item any recipe mentions, plus the target, sorted.
    items: Vec<String>,
}

/// Variables of one LP instance, parallel to the model's orderings.
struct RateVariables {
    rates: Vec<Variable>,
    machines: Vec<Variable>,
}

/// Optimal variable values pulled out of a solved LP.
struct PlanValues {
    rates: Vec<f64>,
    machines: Vec<f64>,
}

impl<'a> PlanModel<'a> {
    fn new(input: &'a FactoryInput) -> Self {
        let mut machine_types: BTreeSet<&str> =
            input.machines.keys().map(String::as_str).collect();
        let mut produced = BTreeSet::new();
        let mut consumed = BTreeSet::new();
        for recipe in &input.recipes {
            machine_types.insert(recipe.machine.as_str());
            for (item, count) in &recipe.outputs {
                if *count > 0.0 {
                    produced.insert(item.as_str());
                }
            }
            for (item, count) in &recipe.inputs {
                if *count > 0.0 {
                    consumed.insert(item.as_str());
                }
            }
        }

        let target = input.target.item.as_str();
        let is_raw = |item: &str| input.raw_supply.contains_key(item);

        let mut items: BTreeSet<&str> = produced.union(&consumed).copied().collect();
        items.insert(target);

        let balance_items = consumed
            .iter()
            .copied()
            .filter(|item| !is_raw(item) && *item != target)
            .map(str::to_owned)
            .collect();

        let raw_items = input
            .raw_supply
            .keys()
            .filter(|item| produced.contains(item.as_str()) || consumed.contains(item.as_str()))
            .cloned()
            .collect();

        PlanModel {
            input,
            machine_types: machine_types.iter().map(|t| (*t).to_owned()).collect(),
            raw_items,
            balance_items,
            items: items.iter().map(|i| (*i).to_owned()).collect(),
        }
    }

    /// The target row needs at least one enabled recipe with a nonzero net
    /// coefficient on the target; with none, both solves would degenerate to
    /// an empty row. A consumer-only recipe keeps the row in the model and
    /// the diagnostic solve answers normally.
    fn target_in_model(&self) -> bool {
        self.input.recipes.iter().any(|recipe| {
            recipe.effective_rate() > TOLERANCE
                && net_coefficient(recipe, &self.input.target.item).abs() > TOLERANCE
        })
    }

    fn add_variables(&self, vars: &mut ProblemVariables) -> RateVariables {
        let rates = self
            .input
            .recipes
            .iter()
            .map(|recipe| {
                // Disabled recipes stay in the model pinned at zero.
                if recipe.effective_rate() > TOLERANCE {
                    vars.add(variable().min(0.0))
                } else {
                    vars.add(variable().min(0.0).max(0.0))
                }
            })
            .collect();
        let machines = self
            .machine_types
            .iter()
            .map(|_| vars.add(variable().min(0.0)))
            .collect();
        RateVariables { rates, machines }
    }

    fn net_expression(&self, lp: &RateVariables, item: &str) -> Expression {
        let mut expr = Expression::from(0.0);
        for (recipe, rate) in self.input.recipes.iter().zip(&lp.rates) {
            let coefficient = net_coefficient(recipe, item);
            if coefficient != 0.0 {
                expr += *rate * coefficient;
            }
        }
        expr
    }

    fn machine_usage_expression(&self, lp: &RateVariables, machine_type: &str) -> Expression {
        let mut expr = Expression::from(0.0);
        for (recipe, rate) in self.input.recipes.iter().zip(&lp.rates) {
            if recipe.machine == machine_type && recipe.effective_rate() > TOLERANCE {
                expr += *rate * (1.0 / recipe.effective_rate());
            }
        }
        expr
    }

    /// Constraints common to the primary and diagnostic solves: machine
    /// accounting and caps, item balance rows, raw supply and
    /// raw-non-production rows.
    fn constrain<M: SolverModel>(&self, mut problem: M, lp: &RateVariables) -> M {
        for (index, machine_type) in self.machine_types.iter().enumerate() {
            let usage = self.machine_usage_expression(lp, machine_type);
            problem = problem.with(constraint!(lp.machines[index] == usage));
            if let Some(cap) = self.input.machines.get(machine_type) {
                let cap = *cap;
                problem = problem.with(constraint!(lp.machines[index] <= cap));
            }
        }

        for item in &self.balance_items {
            problem = problem.with(constraint!(self.net_expression(lp, item) == 0.0));
        }

        for item in &self.raw_items {
            let supply = self.input.raw_supply[item];
            let net = self.net_expression(lp, item);
            // Raws are never net-produced, and net consumption (-net) stays
            // within the supply cap.
            problem = problem.with(constraint!(net.clone() <= 0.0));
            problem = problem.with(constraint!(net >= -supply));
        }

        problem
    }

    fn extract<S: Solution>(&self, solution: &S, lp: &RateVariables) -> PlanValues {
        PlanValues {
            rates: lp.rates.iter().map(|v| solution.value(*v)).collect(),
            machines: lp.machines.iter().map(|v| solution.value(*v)).collect(),
        }
    }

    /// Primary solve: minimize total machines subject to hitting the target
    /// rate exactly. `None` means infeasible.
    fn minimize_machines(&self) -> SolverResult<Option<PlanValues>> {
        let mut vars = variables!();
        let lp = self.add_variables(&mut vars);
        let objective = lp
            .machines
            .iter()
            .fold(Expression::from(0.0), |acc, m| acc + *m);

        let mut problem = vars.minimise(objective).using(default_solver);
        problem = self.constrain(problem, &lp);
        problem = problem.with(constraint!(
            self.net_expression(&lp, &self.input.target.item) == self.input.target.rate_per_min
        ));

        match problem.solve() {
            Ok(solution) => Ok(Some(self.extract(&solution, &lp))),
            Err(ResolutionError::Infeasible) => Ok(None),
            Err(err) => Err(SolverError::SolverFailure {
                phase: "factory plan solve",
                message: err.to_string(),
            }),
        }
    }

    /// Diagnostic solve: maximize the achievable target rate, then read
    /// capacity slacks at the optimum for bottleneck hints.
    fn diagnose(&self) -> SolverResult<FactoryOutput> {
        let mut vars = variables!();
        let lp = self.add_variables(&mut vars);
        let achieved = vars.add(variable().min(0.0));

        let mut problem = vars.maximise(achieved).using(default_solver);
        problem = self.constrain(problem, &lp);
        problem = problem.with(constraint!(
            self.net_expression(&lp, &self.input.target.item) == achieved
        ));

        let solution = match problem.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                // The zero plan satisfies every remaining constraint, so
                // this branch is solver backpressure rather than a real
                // verdict. Answer conservatively.
                return Ok(FactoryOutput::Infeasible {
                    reason: "no production plan satisfies the machine and raw-supply constraints"
                        .to_string(),
                    max_rate: 0.0,
                    bottlenecks: Vec::new(),
                });
            }
            Err(err) => {
                return Err(SolverError::SolverFailure {
                    phase: "factory rate diagnostic",
                    message: err.to_string(),
                })
            }
        };

        let plan = self.extract(&solution, &lp);
        let max_rate = clamp_small_negative(solution.value(achieved));
        debug!(max_rate, "rate diagnostic solved");

        let mut bottlenecks = Vec::new();
        for (index, machine_type) in self.machine_types.iter().enumerate() {
            if let Some(cap) = self.input.machines.get(machine_type) {
                // Only caps some enabled recipe can press against are
                // eligible hints.
                let uses_type = self
                    .input
                    .recipes
                    .iter()
                    .any(|r| r.machine == *machine_type && r.effective_rate() > TOLERANCE);
                if uses_type && cap - plan.machines[index] <= BINDING_SLACK {
                    bottlenecks.push(machine_type.clone());
                }
            }
        }
        for item in &self.raw_items {
            let consumption = -self.net_value(&plan.rates, item);
            if self.input.raw_supply[item] - consumption <= BINDING_SLACK {
                bottlenecks.push(item.clone());
            }
        }

        Ok(FactoryOutput::Infeasible {
            reason: format!(
                "requested {} per minute of {}, but at most {} per minute is sustainable",
                self.input.target.rate_per_min, self.input.target.item, max_rate
            ),
            max_rate,
            bottlenecks,
        })
    }

    fn net_value(&self, rates: &[f64], item: &str) -> f64 {
        self.input
            .recipes
            .iter()
            .zip(rates)
            .map(|(recipe, rate)| net_coefficient(recipe, item) * rate)
            .sum()
    }

    /// Gross productivity-scaled production of `item` under the plan.
    fn production_value(&self, rates: &[f64], item: &str) -> f64 {
        self.input
            .recipes
            .iter()
            .zip(rates)
            .map(|(recipe, rate)| {
                recipe.outputs.get(item).copied().unwrap_or(0.0)
                    * recipe.productivity_multiplier
                    * rate
            })
            .sum()
    }

    fn report(&self, plan: &PlanValues) -> FactoryOutput {
        let crafts_per_min = self
            .input
            .recipes
            .iter()
            .zip(&plan.rates)
            .map(|(recipe, rate)| (recipe.id.clone(), clamp_small_negative(*rate)))
            .collect();
        let machines_used = self
            .machine_types
            .iter()
            .zip(&plan.machines)
            .map(|(machine_type, count)| (machine_type.clone(), clamp_small_negative(*count)))
            .collect();
        let production = self
            .items
            .iter()
            .map(|item| {
                (
                    item.clone(),
                    clamp_small_negative(self.production_value(&plan.rates, item)),
                )
            })
            .collect();

        FactoryOutput::Ok {
            crafts_per_min,
            machines_used,
            production,
        }
    }
}

fn validate(input: &FactoryInput) -> SolverResult<()> {
    let invalid = |message: String| Err(SolverError::InvalidInput(message));

    let target = &input.target;
    if !target.rate_per_min.is_finite() || target.rate_per_min <= 0.0 {
        return invalid(format!(
            "target rate_per_min must be a positive finite number, got {}",
            target.rate_per_min
        ));
    }

    let mut seen_ids = BTreeSet::new();
    for recipe in &input.recipes {
        if !seen_ids.insert(recipe.id.as_str()) {
            return invalid(format!("duplicate recipe id {:?}", recipe.id));
        }
        if !recipe.base_crafts_per_min.is_finite() || recipe.base_crafts_per_min < 0.0 {
            return invalid(format!(
                "recipe {:?} has invalid base_crafts_per_min {}",
                recipe.id, recipe.base_crafts_per_min
            ));
        }
        if !recipe.speed_multiplier.is_finite() || recipe.speed_multiplier < 0.0 {
            return invalid(format!(
                "recipe {:?} has invalid speed_multiplier {}",
                recipe.id, recipe.speed_multiplier
            ));
        }
        if !recipe.productivity_multiplier.is_finite() || recipe.productivity_multiplier < 1.0 {
            return invalid(format!(
                "recipe {:?} has invalid productivity_multiplier {} (must be >= 1)",
                recipe.id, recipe.productivity_multiplier
            ));
        }
        for (item, count) in recipe.inputs.iter().chain(&recipe.outputs) {
            if !count.is_finite() || *count < 0.0 {
                return invalid(format!(
                    "recipe {:?} has negative count {} for item {:?}",
                    recipe.id, count, item
                ));
            }
        }
    }

    for (machine_type, cap) in &input.machines {
        if !cap.is_finite() || *cap < 0.0 {
            return invalid(format!(
                "machine cap for {:?} must be non-negative, got {}",
                machine_type, cap
            ));
        }
    }
    for (item, supply) in &input.raw_supply {
        if !supply.is_finite() || *supply < 0.0 {
            return invalid(format!(
                "raw supply for {:?} must be non-negative, got {}",
                item, supply
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    use super::*;

    fn parse(doc: serde_json::Value) -> FactoryInput {
        serde_json::from_value(doc).unwrap()
    }

    fn gears_input(machine_cap: f64, target_rate: f64) -> FactoryInput {
        parse(json!({
            "recipes": [{
                "id": "gear",
                "machine": "assembler",
                "base_crafts_per_min": 60.0,
                "inputs": {"iron_plate": 1.0},
                "outputs": {"iron_gear": 1.0}
            }],
            "machines": {"assembler": machine_cap},
            "raw_supply": {"iron_plate": 200.0},
            "target": {"item": "iron_gear", "rate_per_min": target_rate}
        }))
    }

    #[test]
    fn feasible_gears_plan() {
        let output = solve_factory(&gears_input(10.0, 10.0)).unwrap();
        match output {
            FactoryOutput::Ok {
                crafts_per_min,
                machines_used,
                production,
            } => {
                assert_abs_diff_eq!(crafts_per_min["gear"], 10.0, epsilon = 1e-6);
                assert_abs_diff_eq!(machines_used["assembler"], 10.0 / 60.0, epsilon = 1e-6);
                assert_abs_diff_eq!(production["iron_gear"], 10.0, epsilon = 1e-6);
                assert_abs_diff_eq!(production["iron_plate"], 0.0, epsilon = 1e-6);
            }
            other => panic!("expected ok, got {other:?}"),
        }
    }

    #[test]
    fn machine_cap_bottleneck_reported() {
        let output = solve_factory(&gears_input(1.0, 5000.0)).unwrap();
        match output {
            FactoryOutput::Infeasible {
                max_rate,
                bottlenecks,
                ..
            } => {
                assert_abs_diff_eq!(max_rate, 60.0, epsilon = 1e-6);
                assert_eq!(bottlenecks, vec!["assembler".to_string()]);
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn unused_machine_cap_is_not_a_bottleneck() {
        let mut input = gears_input(1.0, 5000.0);
        input.machines.insert("ghost_machine".to_string(), 0.0);

        match solve_factory(&input).unwrap() {
            FactoryOutput::Infeasible {
                max_rate,
                bottlenecks,
                ..
            } => {
                assert_abs_diff_eq!(max_rate, 60.0, epsilon = 1e-6);
                assert_eq!(bottlenecks, vec!["assembler".to_string()]);
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn consumer_only_recipe_still_reaches_the_diagnostic() {
        // Nothing produces gears, but the burner consumes them, so the
        // target row stays in the model and its binding cap gets hinted.
        let input = parse(json!({
            "recipes": [{
                "id": "burn_gears",
                "machine": "burner",
                "base_crafts_per_min": 60.0,
                "inputs": {"iron_gear": 1.0},
                "outputs": {"ash": 1.0}
            }],
            "machines": {"burner": 0.0},
            "target": {"item": "iron_gear", "rate_per_min": 10.0}
        }));

        match solve_factory(&input).unwrap() {
            FactoryOutput::Infeasible {
                max_rate,
                bottlenecks,
                ..
            } => {
                assert_abs_diff_eq!(max_rate, 0.0, epsilon = 1e-6);
                assert_eq!(bottlenecks, vec!["burner".to_string()]);
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn raw_supply_bottleneck_reported() {
        let input = parse(json!({
            "recipes": [{
                "id": "gear",
                "machine": "assembler",
                "base_crafts_per_min": 60.0,
                "inputs": {"iron_plate": 1.0},
                "outputs": {"iron_gear": 1.0}
            }],
            "machines": {"assembler": 100.0},
            "raw_supply": {"iron_plate": 20.0},
            "target": {"item": "iron_gear", "rate_per_min": 5000.0}
        }));

        match solve_factory(&input).unwrap() {
            FactoryOutput::Infeasible {
                max_rate,
                bottlenecks,
                ..
            } => {
                assert_abs_diff_eq!(max_rate, 20.0, epsilon = 1e-6);
                assert_eq!(bottlenecks, vec!["iron_plate".to_string()]);
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn byproduct_accumulates_without_a_balance_row() {
        let input = parse(json!({
            "recipes": [{
                "id": "smelt",
                "machine": "furnace",
                "base_crafts_per_min": 60.0,
                "inputs": {"ore": 1.0},
                "outputs": {"plate": 1.0, "slag": 0.5}
            }],
            "machines": {"furnace": 10.0},
            "raw_supply": {"ore": 100.0},
            "target": {"item": "plate", "rate_per_min": 10.0}
        }));

        match solve_factory(&input).unwrap() {
            FactoryOutput::Ok { production, .. } => {
                assert_abs_diff_eq!(production["plate"], 10.0, epsilon = 1e-6);
                assert_abs_diff_eq!(production["slag"], 5.0, epsilon = 1e-6);
            }
            other => panic!("expected ok, got {other:?}"),
        }
    }

    fn chain_input(scale: f64) -> FactoryInput {
        parse(json!({
            "recipes": [
                {
                    "id": "smelt",
                    "machine": "furnace",
                    "base_crafts_per_min": 30.0,
                    "inputs": {"iron_ore": 1.0},
                    "outputs": {"iron_plate": 1.0}
                },
                {
                    "id": "gear",
                    "machine": "assembler",
                    "base_crafts_per_min": 60.0,
                    "inputs": {"iron_plate": 2.0},
                    "outputs": {"iron_gear": 1.0}
                }
            ],
            "machines": {"furnace": 50.0, "assembler": 50.0},
            "raw_supply": {"iron_ore": 1000.0 * scale},
            "target": {"item": "iron_gear", "rate_per_min": 10.0 * scale}
        }))
    }

    #[test]
    fn intermediate_chain_balances() {
        match solve_factory(&chain_input(1.0)).unwrap() {
            FactoryOutput::Ok {
                crafts_per_min,
                machines_used,
                production,
            } => {
                assert_abs_diff_eq!(crafts_per_min["gear"], 10.0, epsilon = 1e-6);
                assert_abs_diff_eq!(crafts_per_min["smelt"], 20.0, epsilon = 1e-6);
                assert_abs_diff_eq!(machines_used["furnace"], 20.0 / 30.0, epsilon = 1e-6);
                assert_abs_diff_eq!(machines_used["assembler"], 10.0 / 60.0, epsilon = 1e-6);
                // Plates are produced at exactly the rate gears consume them.
                assert_abs_diff_eq!(production["iron_plate"], 20.0, epsilon = 1e-6);
                assert_abs_diff_eq!(production["iron_gear"], 10.0, epsilon = 1e-6);
            }
            other => panic!("expected ok, got {other:?}"),
        }
    }

    #[test]
    fn outputs_scale_with_the_input_rates() {
        let base = solve_factory(&chain_input(1.0)).unwrap();
        let scaled = solve_factory(&chain_input(2.5)).unwrap();
        let (
            FactoryOutput::Ok {
                crafts_per_min: base_crafts,
                machines_used: base_machines,
                ..
            },
            FactoryOutput::Ok {
                crafts_per_min: scaled_crafts,
                machines_used: scaled_machines,
                ..
            },
        ) = (base, scaled)
        else {
            panic!("expected both plans to be feasible");
        };

        for (id, value) in &base_crafts {
            assert_abs_diff_eq!(scaled_crafts[id], value * 2.5, epsilon = 1e-6);
        }
        for (id, value) in &base_machines {
            assert_abs_diff_eq!(scaled_machines[id], value * 2.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn resolving_is_byte_identical() {
        let first = serde_json::to_string(&solve_factory(&chain_input(1.0)).unwrap()).unwrap();
        let second = serde_json::to_string(&solve_factory(&chain_input(1.0)).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn productivity_multiplier_scales_outputs() {
        let input = parse(json!({
            "recipes": [{
                "id": "smelt",
                "machine": "furnace",
                "base_crafts_per_min": 30.0,
                "inputs": {"ore": 1.0},
                "outputs": {"plate": 1.0},
                "productivity_multiplier": 1.2
            }],
            "machines": {"furnace": 10.0},
            "raw_supply": {"ore": 100.0},
            "target": {"item": "plate", "rate_per_min": 12.0}
        }));

        match solve_factory(&input).unwrap() {
            FactoryOutput::Ok {
                crafts_per_min,
                production,
                ..
            } => {
                // 10 crafts at 1.2 plates each.
                assert_abs_diff_eq!(crafts_per_min["smelt"], 10.0, epsilon = 1e-6);
                assert_abs_diff_eq!(production["plate"], 12.0, epsilon = 1e-6);
            }
            other => panic!("expected ok, got {other:?}"),
        }
    }

    #[test]
    fn speed_multiplier_lowers_machine_count() {
        let input = parse(json!({
            "recipes": [{
                "id": "gear",
                "machine": "assembler",
                "base_crafts_per_min": 60.0,
                "inputs": {"iron_plate": 1.0},
                "outputs": {"iron_gear": 1.0},
                "speed_multiplier": 2.0
            }],
            "machines": {"assembler": 10.0},
            "raw_supply": {"iron_plate": 200.0},
            "target": {"item": "iron_gear", "rate_per_min": 12.0}
        }));

        match solve_factory(&input).unwrap() {
            FactoryOutput::Ok { machines_used, .. } => {
                assert_abs_diff_eq!(machines_used["assembler"], 12.0 / 120.0, epsilon = 1e-6);
            }
            other => panic!("expected ok, got {other:?}"),
        }
    }

    #[test]
    fn zero_speed_disables_a_recipe() {
        let input = parse(json!({
            "recipes": [{
                "id": "gear",
                "machine": "assembler",
                "base_crafts_per_min": 60.0,
                "inputs": {"iron_plate": 1.0},
                "outputs": {"iron_gear": 1.0},
                "speed_multiplier": 0.0
            }],
            "machines": {"assembler": 10.0},
            "raw_supply": {"iron_plate": 200.0},
            "target": {"item": "iron_gear", "rate_per_min": 10.0}
        }));

        match solve_factory(&input).unwrap() {
            FactoryOutput::Infeasible {
                max_rate,
                bottlenecks,
                ..
            } => {
                assert_eq!(max_rate, 0.0);
                assert!(bottlenecks.is_empty());
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn unsourced_ingredient_pins_its_consumer() {
        // "catalyst" is neither raw nor produced by anything, so the gear
        // recipe cannot run at all.
        let input = parse(json!({
            "recipes": [{
                "id": "gear",
                "machine": "assembler",
                "base_crafts_per_min": 60.0,
                "inputs": {"iron_plate": 1.0, "catalyst": 0.1},
                "outputs": {"iron_gear": 1.0}
            }],
            "machines": {"assembler": 10.0},
            "raw_supply": {"iron_plate": 200.0},
            "target": {"item": "iron_gear", "rate_per_min": 10.0}
        }));

        match solve_factory(&input).unwrap() {
            FactoryOutput::Infeasible { max_rate, .. } => {
                assert_abs_diff_eq!(max_rate, 0.0, epsilon = 1e-6);
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn validation_rejects_bad_documents() {
        let mut duplicate = gears_input(10.0, 10.0);
        duplicate.recipes.push(duplicate.recipes[0].clone());
        assert!(matches!(
            solve_factory(&duplicate),
            Err(SolverError::InvalidInput(_))
        ));

        let mut zero_rate = gears_input(10.0, 10.0);
        zero_rate.target.rate_per_min = 0.0;
        assert!(matches!(
            solve_factory(&zero_rate),
            Err(SolverError::InvalidInput(_))
        ));

        let mut negative_count = gears_input(10.0, 10.0);
        negative_count.recipes[0]
            .inputs
            .insert("iron_plate".to_string(), -1.0);
        assert!(matches!(
            solve_factory(&negative_count),
            Err(SolverError::InvalidInput(_))
        ));

        let mut low_productivity = gears_input(10.0, 10.0);
        low_productivity.recipes[0].productivity_multiplier = 0.5;
        assert!(matches!(
            solve_factory(&low_productivity),
            Err(SolverError::InvalidInput(_))
        ));
    }
}
