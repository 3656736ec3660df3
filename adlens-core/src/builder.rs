use crate::filter::{create_condition, validate_condition, ConditionError, ConditionId, FilterSet};
use crate::record::AdCreative;
use crate::taxonomy::{resolve_field, Category, FieldType, Operator, CATEGORIES, TAGS};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderPhase {
    Idle,
    CategoryPicking,
    ConditionEditing,
}

/// Widget the value step should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Select,
    Number,
    NumberRange,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSlot {
    Start,
    End,
}

#[derive(Debug, Clone)]
pub struct FilterBuilder {
    phase: BuilderPhase,
    tab: usize,
    search: String,
    selected_option: Option<String>,
    operator: Option<Operator>,
    value: String,
    value_end: String,
    slot: ValueSlot,
}

impl Default for FilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterBuilder {
    pub fn new() -> Self {
        let tab = CATEGORIES.iter().position(|c| c.name == TAGS).unwrap_or(0);
        Self {
            phase: BuilderPhase::Idle,
            tab,
            search: String::new(),
            selected_option: None,
            operator: None,
            value: String::new(),
            value_end: String::new(),
            slot: ValueSlot::Start,
        }
    }

    pub fn phase(&self) -> BuilderPhase {
        self.phase
    }
    pub fn is_open(&self) -> bool {
        self.phase != BuilderPhase::Idle
    }
    pub fn active_category(&self) -> &'static Category {
        &CATEGORIES[self.tab]
    }
    pub fn search(&self) -> &str {
        &self.search
    }
    pub fn selected_option(&self) -> Option<&str> {
        self.selected_option.as_deref()
    }
    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }
    pub fn value(&self) -> &str {
        &self.value
    }
    pub fn value_end(&self) -> &str {
        &self.value_end
    }
    pub fn focused_slot(&self) -> ValueSlot {
        self.slot
    }

    // --- transitions ---

    /// Idle -> CategoryPicking with a clean selection and search.
    pub fn open(&mut self) {
        self.phase = BuilderPhase::CategoryPicking;
        self.selected_option = None;
        self.operator = None;
        self.value.clear();
        self.value_end.clear();
        self.search.clear();
        self.slot = ValueSlot::Start;
    }

    /// Back to Idle without committing anything.
    pub fn cancel(&mut self) {
        self.phase = BuilderPhase::Idle;
    }

    pub fn select_tab(&mut self, name: &str) -> bool {
        if self.phase != BuilderPhase::CategoryPicking {
            return false;
        }
        match CATEGORIES.iter().position(|c| c.name == name) {
            Some(i) => {
                self.tab = i;
                true
            }
            None => false,
        }
    }

    pub fn next_tab(&mut self) {
        if self.phase == BuilderPhase::CategoryPicking {
            self.tab = (self.tab + 1) % CATEGORIES.len();
        }
    }

    pub fn prev_tab(&mut self) {
        if self.phase == BuilderPhase::CategoryPicking {
            self.tab = (self.tab + CATEGORIES.len() - 1) % CATEGORIES.len();
        }
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_string();
    }

    /// Options of the active tab whose label contains the search text, ignoring case.
    pub fn visible_options(&self) -> Vec<&'static str> {
        let needle = self.search.to_lowercase();
        self.active_category()
            .option_labels()
            .into_iter()
            .filter(|o| o.to_lowercase().contains(&needle))
            .collect()
    }

    /// CategoryPicking -> ConditionEditing; operator resets to the category default.
    pub fn select_option(&mut self, label: &str) -> bool {
        if self.phase != BuilderPhase::CategoryPicking || !self.active_category().has_option(label) {
            return false;
        }
        self.selected_option = Some(label.to_string());
        self.operator = Some(self.active_category().default_operator());
        self.value.clear();
        self.value_end.clear();
        self.slot = ValueSlot::Start;
        self.phase = BuilderPhase::ConditionEditing;
        true
    }

    /// ConditionEditing -> CategoryPicking, dropping the picked option.
    pub fn back(&mut self) {
        if self.phase == BuilderPhase::ConditionEditing {
            self.selected_option = None;
            self.phase = BuilderPhase::CategoryPicking;
        }
    }

    /// Only operators of the active category are accepted; entered values are kept.
    pub fn set_operator(&mut self, op: Operator) -> bool {
        if self.phase != BuilderPhase::ConditionEditing || !self.active_category().allows(op) {
            return false;
        }
        self.operator = Some(op);
        if op.arity() == 1 {
            self.slot = ValueSlot::Start;
        }
        true
    }

    pub fn cycle_operator(&mut self, forward: bool) {
        let ops = self.active_category().operators;
        let Some(cur) = self.operator else { return };
        let idx = ops.iter().position(|o| *o == cur).unwrap_or(0);
        let next = if forward { (idx + 1) % ops.len() } else { (idx + ops.len() - 1) % ops.len() };
        self.set_operator(ops[next]);
    }

    pub fn set_value(&mut self, v: &str) {
        if self.phase == BuilderPhase::ConditionEditing {
            self.value = v.to_string();
        }
    }

    pub fn set_value_end(&mut self, v: &str) {
        if self.phase == BuilderPhase::ConditionEditing {
            self.value_end = v.to_string();
        }
    }

    pub fn toggle_slot(&mut self) {
        if self.operator.map(Operator::arity) == Some(2) {
            self.slot = match self.slot {
                ValueSlot::Start => ValueSlot::End,
                ValueSlot::End => ValueSlot::Start,
            };
        }
    }

    /// Type into whichever text input the current phase exposes.
    pub fn push_char(&mut self, c: char) {
        match self.phase {
            BuilderPhase::Idle => {}
            BuilderPhase::CategoryPicking => self.search.push(c),
            BuilderPhase::ConditionEditing => match self.slot {
                ValueSlot::Start => self.value.push(c),
                ValueSlot::End => self.value_end.push(c),
            },
        }
    }

    pub fn pop_char(&mut self) {
        match self.phase {
            BuilderPhase::Idle => {}
            BuilderPhase::CategoryPicking => {
                self.search.pop();
            }
            BuilderPhase::ConditionEditing => {
                match self.slot {
                    ValueSlot::Start => self.value.pop(),
                    ValueSlot::End => self.value_end.pop(),
                };
            }
        }
    }

    pub fn input_kind(&self) -> InputKind {
        match self.active_category().field_type {
            FieldType::Select => InputKind::Select,
            FieldType::Number if self.operator == Some(Operator::Between) => InputKind::NumberRange,
            FieldType::Number => InputKind::Number,
            FieldType::Text => InputKind::Text,
        }
    }

    /// Distinct non-empty values of the picked option's field, sorted.
    pub fn value_choices(&self, records: &[AdCreative]) -> Vec<String> {
        let Some(option) = self.selected_option.as_deref() else { return Vec::new() };
        let field = resolve_field(option);
        records
            .iter()
            .map(|r| field.value(r).to_string())
            .filter(|v| !v.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Step the select picker through `choices`, wrapping around.
    pub fn cycle_choice(&mut self, choices: &[String], forward: bool) {
        if self.phase != BuilderPhase::ConditionEditing || choices.is_empty() {
            return;
        }
        let next = match choices.iter().position(|c| *c == self.value) {
            Some(i) if forward => (i + 1) % choices.len(),
            Some(i) => (i + choices.len() - 1) % choices.len(),
            None if forward => 0,
            None => choices.len() - 1,
        };
        self.value = choices[next].clone();
    }

    // --- commit ---

    fn end_input(&self) -> Option<&str> {
        (self.operator == Some(Operator::Between)).then_some(self.value_end.as_str())
    }

    /// Why the current input cannot be applied, if it cannot.
    pub fn validation_error(&self) -> Option<ConditionError> {
        if self.phase != BuilderPhase::ConditionEditing {
            return None;
        }
        let (Some(option), Some(op)) = (self.selected_option.as_deref(), self.operator) else {
            return None;
        };
        validate_condition(self.active_category().name, option, op, &self.value, self.end_input()).err()
    }

    /// Gate for both the apply action and the rendered Apply control.
    pub fn can_apply(&self) -> bool {
        self.phase == BuilderPhase::ConditionEditing
            && self.selected_option.is_some()
            && self.operator.is_some()
            && self.validation_error().is_none()
    }

    /// Commit the pending condition into `set`, notify once and close the builder.
    /// Invalid input leaves the builder and `set` untouched and does not notify.
    pub fn apply<F>(&mut self, set: &mut FilterSet, mut on_change: F) -> Option<ConditionId>
    where
        F: FnMut(&FilterSet),
    {
        if !self.can_apply() {
            return None;
        }
        let (Some(option), Some(op)) = (self.selected_option.as_deref(), self.operator) else {
            return None;
        };
        let condition =
            create_condition(self.active_category().name, option, op, &self.value, self.end_input()).ok()?;
        let id = condition.id;
        tracing::debug!(id = %id, field = %condition.field, op = op.id(), "filter applied");
        set.push(condition);
        self.phase = BuilderPhase::Idle;
        on_change(set);
        Some(id)
    }

    /// Remove `id` from `set` and notify once.
    pub fn remove<F>(set: &mut FilterSet, id: ConditionId, mut on_change: F) -> bool
    where
        F: FnMut(&FilterSet),
    {
        let removed = set.remove(id);
        tracing::debug!(id = %id, removed, "filter removed");
        on_change(set);
        removed
    }
}
