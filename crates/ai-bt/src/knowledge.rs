//! Per-instance knowledge: blackboard, goals, sensors and the instance-level channels nodes use
//! (events, randomness, diagnostics, stop requests).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ai_core::{SplitMix64, TypeRegistry, Variant};
use ai_tools::{Diagnostic, DiagnosticLog, DiagnosticSink};

use crate::bt::UpdateResult;
use crate::events::EventQueue;
use crate::tree::RootSettings;

const GOAL_PREFIX: &str = "Goal";
const BLACKBOARD_PREFIX: &str = "Blackboard";

pub struct Knowledge {
    blackboard: Variant,
    blackboard_type: Option<String>,
    goals: Vec<Variant>,
    accepted_goals: Vec<String>,
    sensors: BTreeMap<String, Variant>,
    types: Arc<TypeRegistry>,
    events: EventQueue,
    rng: SplitMix64,
    stop_request: Option<UpdateResult>,
    reported: BTreeSet<String>,
    log: DiagnosticLog,
    sink: Option<Box<dyn DiagnosticSink>>,
}

impl Default for Knowledge {
    fn default() -> Self {
        Self::new(Arc::new(TypeRegistry::new()), 0)
    }
}

impl Knowledge {
    pub fn new(types: Arc<TypeRegistry>, seed: u64) -> Self {
        Self {
            blackboard: Variant::Null,
            blackboard_type: None,
            goals: Vec::new(),
            accepted_goals: Vec::new(),
            sensors: BTreeMap::new(),
            types,
            events: EventQueue::new(),
            rng: SplitMix64::new(seed),
            stop_request: None,
            reported: BTreeSet::new(),
            log: DiagnosticLog::default(),
            sink: None,
        }
    }

    /// Adopt the blackboard declaration and goal filter of a tree root.
    pub fn configure(&mut self, root: &RootSettings) {
        self.blackboard_type = root.blackboard_type.clone();
        self.accepted_goals = root.goal_types.clone();
    }

    pub(crate) fn install_default_blackboard(&mut self, root: &RootSettings) {
        if self.blackboard.is_null() {
            self.blackboard = root.blackboard_default.clone();
        }
    }

    /// Drop goals and blackboard contents; sensors and diagnostics survive.
    pub fn reset(&mut self, root: &RootSettings) {
        self.configure(root);
        self.blackboard = root.blackboard_default.clone();
        self.goals.clear();
        self.stop_request = None;
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn set_types(&mut self, types: Arc<TypeRegistry>) {
        self.types = types;
    }

    pub fn blackboard(&self) -> &Variant {
        &self.blackboard
    }

    pub fn blackboard_type(&self) -> Option<&str> {
        self.blackboard_type.as_deref()
    }

    /// Replace the blackboard. Refused when the value is not assignable to the declared type;
    /// a declared type also rules out clearing the blackboard to `Null`.
    pub fn set_blackboard(&mut self, value: Variant) -> bool {
        if let Some(expected) = &self.blackboard_type {
            if value.is_null() || !self.types.is_assignable(value.type_name(), expected) {
                return false;
            }
        }
        self.blackboard = value;
        true
    }

    /// Resolve a selector path (`Blackboard.X.Y`, `Goal<Type>.X`, `<Sensor>.X`).
    pub fn get(&self, path: &str) -> Option<Variant> {
        if path.is_empty() {
            return None;
        }
        if let Some((index, rest)) = self.find_goal(path) {
            return self.goals[index].get_path(&rest);
        }
        let segments: Vec<&str> = path.split('.').collect();
        let (head, rest) = segments.split_first()?;
        if *head == BLACKBOARD_PREFIX {
            return self.blackboard.get_path(rest);
        }
        self.sensors.get(*head)?.get_path(rest)
    }

    pub fn get_f32(&self, path: &str) -> Option<f32> {
        self.get(path)?.as_f32()
    }

    /// Write through a selector path. Returns `false` when the path is unresolved or the value
    /// does not fit the addressed slot.
    pub fn set(&mut self, path: &str, value: Variant) -> bool {
        if path.is_empty() {
            return false;
        }
        if let Some((index, rest)) = self.find_goal(path) {
            let goal = &mut self.goals[index];
            if rest.is_empty() {
                if value.type_name() != goal.type_name() {
                    return false;
                }
                *goal = value;
                return true;
            }
            return goal.set_path(&rest, value);
        }
        let segments: Vec<&str> = path.split('.').collect();
        let Some((head, rest)) = segments.split_first() else {
            return false;
        };
        if *head == BLACKBOARD_PREFIX {
            if rest.is_empty() {
                return self.set_blackboard(value);
            }
            return self.blackboard.set_path(rest, value);
        }
        match self.sensors.get_mut(*head) {
            Some(sensor) if rest.is_empty() => sensor.assign(value),
            Some(sensor) => sensor.set_path(rest, value),
            None => false,
        }
    }

    /// Goal whose type name is the longest prefix of the path after `Goal`.
    fn find_goal<'p>(&self, path: &'p str) -> Option<(usize, Vec<&'p str>)> {
        let tail = path.strip_prefix(GOAL_PREFIX)?;
        let mut best: Option<(usize, usize)> = None;
        for (index, goal) in self.goals.iter().enumerate() {
            let name = goal.type_name();
            let matches = tail == name
                || (tail.starts_with(name) && tail[name.len()..].starts_with('.'));
            if matches && best.is_none_or(|(_, len)| name.len() > len) {
                best = Some((index, name.len()));
            }
        }
        let (index, len) = best?;
        let rest = match tail[len..].strip_prefix('.') {
            Some(fields) => fields.split('.').collect(),
            None => Vec::new(),
        };
        Some((index, rest))
    }

    pub fn goals(&self) -> &[Variant] {
        &self.goals
    }

    pub fn goal(&self, type_name: &str) -> Option<&Variant> {
        self.goals.iter().find(|g| g.type_name() == type_name)
    }

    pub fn has_goal(&self, type_name: &str) -> bool {
        self.goal(type_name).is_some()
    }

    /// Add or replace the goal of the same type.
    ///
    /// Only structures are goals, and the root may restrict the accepted goal types.
    pub fn add_goal(&mut self, goal: Variant) -> bool {
        if goal.as_structure().is_none() {
            return false;
        }
        let type_name = goal.type_name().to_string();
        if !self.accepted_goals.is_empty() && !self.accepted_goals.contains(&type_name) {
            return false;
        }
        match self.goals.iter_mut().find(|g| g.type_name() == type_name) {
            Some(existing) => *existing = goal,
            None => self.goals.push(goal),
        }
        true
    }

    pub fn remove_goal(&mut self, type_name: &str) -> Option<Variant> {
        let index = self.goals.iter().position(|g| g.type_name() == type_name)?;
        Some(self.goals.remove(index))
    }

    pub fn clear_goals(&mut self) {
        self.goals.clear();
    }

    pub fn sensor(&self, name: &str) -> Option<&Variant> {
        self.sensors.get(name)
    }

    pub fn set_sensor(&mut self, name: impl Into<String>, value: impl Into<Variant>) {
        self.sensors.insert(name.into(), value.into());
    }

    pub fn remove_sensor(&mut self, name: &str) -> Option<Variant> {
        self.sensors.remove(name)
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    pub fn rng_mut(&mut self) -> &mut SplitMix64 {
        &mut self.rng
    }

    /// Ask the owning instance to stop once the current period completes. First request wins.
    pub fn request_stop(&mut self, result: UpdateResult) {
        self.stop_request.get_or_insert(result);
    }

    pub fn take_stop_request(&mut self) -> Option<UpdateResult> {
        self.stop_request.take()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        if let Some(sink) = self.sink.as_mut() {
            sink.report(diagnostic.clone());
        }
        self.log.push(diagnostic);
    }

    /// Report `diagnostic` unless something was already reported under `key`.
    pub fn report_once(&mut self, key: impl Into<String>, diagnostic: Diagnostic) -> bool {
        if !self.reported.insert(key.into()) {
            return false;
        }
        self.report(diagnostic);
        true
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.log
    }

    pub fn set_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = Some(sink);
    }
}

#[cfg(test)]
mod tests {
    use ai_core::{Structure, Vec3};

    use super::*;

    fn knowledge() -> Knowledge {
        let mut knowledge = Knowledge::default();
        knowledge.set_blackboard(Variant::Structure(
            Structure::new("GuardBoard")
                .with_field("Alert", 0.5f32)
                .with_field("Home", Vec3::new(1.0, 0.0, 2.0)),
        ));
        knowledge
    }

    #[test]
    fn blackboard_paths_read_and_write_fields() {
        let mut k = knowledge();
        assert_eq!(k.get("Blackboard.Alert"), Some(Variant::Float(0.5)));
        assert_eq!(k.get_f32("Blackboard.Home.z"), Some(2.0));
        assert!(k.set("Blackboard.Alert", Variant::Float(0.9)));
        assert_eq!(k.get_f32("Blackboard.Alert"), Some(0.9));
        assert_eq!(k.get("Blackboard.Missing"), None);
        assert!(!k.set("Nothing.Here", Variant::Bool(true)));
    }

    #[test]
    fn goal_paths_prefer_the_longest_type_name() {
        let mut k = knowledge();
        assert!(k.add_goal(Variant::Structure(
            Structure::new("Attack").with_field("Range", 2.0f32)
        )));
        assert!(k.add_goal(Variant::Structure(
            Structure::new("AttackMelee").with_field("Range", 1.0f32)
        )));

        assert_eq!(k.get_f32("GoalAttack.Range"), Some(2.0));
        assert_eq!(k.get_f32("GoalAttackMelee.Range"), Some(1.0));
        assert_eq!(k.get("GoalAttackRanged.Range"), None);
        assert!(k.get("GoalAttack").is_some());
    }

    #[test]
    fn sensors_are_addressed_by_bare_name() {
        let mut k = knowledge();
        k.set_sensor("Noise", 3.0f32);
        assert_eq!(k.get_f32("Noise"), Some(3.0));
        assert!(k.set("Noise", Variant::Float(1.0)));
        assert_eq!(k.get_f32("Noise"), Some(1.0));
    }

    #[test]
    fn goals_are_unique_per_type_name() {
        let mut k = knowledge();
        let attack = |range: f32| {
            Variant::Structure(Structure::new("Attack").with_field("Range", range))
        };
        assert!(k.add_goal(attack(2.0)));
        assert!(k.add_goal(attack(5.0)));
        assert!(k.add_goal(Variant::Structure(Structure::new("AttackMelee"))));

        assert_eq!(k.goals().len(), 2);
        assert_eq!(k.get_f32("GoalAttack.Range"), Some(5.0));

        assert!(!k.set("GoalAttack", Variant::Structure(Structure::new("Flee"))));
        assert!(!k.set("GoalAttack.Range", Variant::from("far")));
        assert_eq!(k.get_f32("GoalAttack.Range"), Some(5.0));
    }

    #[test]
    fn declared_blackboard_type_rejects_null_and_foreign_values() {
        let mut k = knowledge();
        k.configure(&RootSettings {
            blackboard_type: Some("GuardBoard".to_string()),
            ..RootSettings::default()
        });

        assert!(!k.set("Blackboard", Variant::Null));
        assert!(!k.set_blackboard(Variant::Structure(Structure::new("Other"))));
        assert_eq!(k.blackboard().type_name(), "GuardBoard");
        assert!(k.set_blackboard(Variant::Structure(Structure::new("GuardBoard"))));

        let mut untyped = Knowledge::default();
        assert!(untyped.set_blackboard(Variant::Null));
    }

    #[test]
    fn stop_requests_keep_the_first_result() {
        let mut k = Knowledge::default();
        k.request_stop(UpdateResult::Failed);
        k.request_stop(UpdateResult::Success);
        assert_eq!(k.take_stop_request(), Some(UpdateResult::Failed));
        assert_eq!(k.take_stop_request(), None);
    }
}
