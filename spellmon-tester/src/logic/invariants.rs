use spellmon_game::{HINT_MAX, LEVEL_UP_XP_BASE, PlayerProgress, ProgressChange};

/// Watches every transition of a store and records rule violations.
#[derive(Debug, Clone)]
pub struct InvariantChecker {
    previous: PlayerProgress,
    violations: Vec<String>,
    changes: usize,
    noops: usize,
    hints_spent: u32,
    hints_granted: u32,
}

impl InvariantChecker {
    #[must_use]
    pub fn new(start: PlayerProgress) -> Self {
        Self {
            previous: start,
            violations: Vec::new(),
            changes: 0,
            noops: 0,
            hints_spent: 0,
            hints_granted: 0,
        }
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub const fn changes(&self) -> usize {
        self.changes
    }

    pub const fn noops(&self) -> usize {
        self.noops
    }

    pub const fn hints_spent(&self) -> u32 {
        self.hints_spent
    }

    pub const fn hints_granted(&self) -> u32 {
        self.hints_granted
    }

    pub fn observe(&mut self, progress: &PlayerProgress, change: &ProgressChange) {
        self.changes += 1;
        if change.is_noop() {
            self.noops += 1;
        }
        match change {
            ProgressChange::HintSpent { .. } => self.hints_spent += 1,
            ProgressChange::WordMastered {
                hint_granted: true, ..
            } => self.hints_granted += 1,
            ProgressChange::Reset => {
                self.hints_spent = 0;
                self.hints_granted = 0;
            }
            _ => {}
        }

        let mut problems = check_snapshot(progress);
        problems.extend(check_transition(&self.previous, progress, change));
        for problem in problems {
            self.violations
                .push(format!("after change #{} ({change}): {problem}", self.changes));
        }
        self.previous = progress.clone();
    }
}

/// Rules every snapshot satisfies on its own.
pub fn check_snapshot(progress: &PlayerProgress) -> Vec<String> {
    let mut problems = Vec::new();
    if progress.hint_charges() > HINT_MAX {
        problems.push(format!(
            "hint charges {} above cap {HINT_MAX}",
            progress.hint_charges()
        ));
    }
    if progress.level() < 1 {
        problems.push("level below 1".to_string());
    }
    if progress.xp_to_next_level() != progress.level().saturating_mul(LEVEL_UP_XP_BASE) {
        problems.push(format!(
            "threshold {} does not match level {}",
            progress.xp_to_next_level(),
            progress.level()
        ));
    }
    if progress.completed_scene_ids() != progress.earned_badge_ids() {
        problems.push(format!(
            "completed scenes {:?} differ from badges {:?}",
            progress.completed_scene_ids(),
            progress.earned_badge_ids()
        ));
    }
    problems
}

fn check_transition(
    previous: &PlayerProgress,
    current: &PlayerProgress,
    change: &ProgressChange,
) -> Vec<String> {
    let mut problems = Vec::new();
    if matches!(change, ProgressChange::Reset) {
        if current != &PlayerProgress::initial() {
            problems.push("reset did not restore the initial snapshot".to_string());
        }
        return problems;
    }
    if change.is_noop() && current != previous {
        problems.push("no-op transition changed the snapshot".to_string());
    }
    if current.xp() < previous.xp() {
        problems.push(format!("xp fell from {} to {}", previous.xp(), current.xp()));
    }
    if current.words_mastered() < previous.words_mastered() {
        problems.push("words mastered decreased".to_string());
    }
    let level_delta = current.level().saturating_sub(previous.level());
    if current.level() < previous.level() || level_delta > 1 {
        problems.push(format!(
            "level jumped from {} to {}",
            previous.level(),
            current.level()
        ));
    }
    if !current
        .collected_item_ids()
        .is_superset(previous.collected_item_ids())
    {
        problems.push("collected items shrank".to_string());
    }
    if !current
        .completed_scene_ids()
        .is_superset(previous.completed_scene_ids())
    {
        problems.push("completed scenes shrank".to_string());
    }
    match change {
        ProgressChange::HintSpent { remaining } => {
            if *remaining != current.hint_charges()
                || previous.hint_charges() != remaining.saturating_add(1)
            {
                problems.push(format!(
                    "hint spend went from {} to {}",
                    previous.hint_charges(),
                    current.hint_charges()
                ));
            }
        }
        ProgressChange::WordMastered { words_mastered, .. } => {
            if *words_mastered != previous.words_mastered().saturating_add(1) {
                problems.push(format!(
                    "word count went from {} to {words_mastered}",
                    previous.words_mastered()
                ));
            }
        }
        _ => {}
    }
    problems
}
