use log::debug;

use crate::project::UserProject;
use crate::time_entry::TimeEntry;

/// 保持する週の数。今週、先週、先々週。
pub const WEEK_COUNT: usize = 3;

/// プロジェクト一覧の取得状態。
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectsState {
    pub fetching: bool,
    pub fetched: bool,
    pub projects: Vec<UserProject>,
    pub status: String,
}

impl Default for ProjectsState {
    fn default() -> Self {
        Self {
            fetching: false,
            fetched: false,
            projects: vec![],
            status: "404".to_string(),
        }
    }
}

/// プロジェクト一覧の取得に関するアクション。
#[derive(Clone, Debug)]
pub enum ProjectsAction {
    FetchStart,
    FetchError(String),
    Receive(Vec<UserProject>),
}

/// プロジェクト一覧の状態を更新した新しい状態を返す。
pub fn projects_reducer(state: ProjectsState, action: ProjectsAction) -> ProjectsState {
    match action {
        ProjectsAction::FetchStart => ProjectsState {
            fetching: true,
            ..state
        },
        ProjectsAction::FetchError(status) => {
            debug!("Projects fetch failed with status {}", status);
            ProjectsState {
                fetching: false,
                status,
                ..state
            }
        }
        ProjectsAction::Receive(projects) => {
            debug!("Received {} projects", projects.len());
            ProjectsState {
                projects,
                fetching: false,
                fetched: true,
                ..state
            }
        }
    }
}

/// 週ごと、および期間指定のtime entry。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeEntriesState {
    pub weeks: [Vec<TimeEntry>; WEEK_COUNT],
    pub period: Vec<TimeEntry>,
}

/// time entryの取得に関するアクション。
#[derive(Clone, Debug)]
pub enum TimeEntriesAction {
    WeekReceived { offset: u32, entries: Vec<TimeEntry> },
    PeriodReceived(Vec<TimeEntry>),
}

/// time entryの状態を更新した新しい状態を返す。
///
/// 範囲外の週のoffsetは無視する。
pub fn time_entries_reducer(
    state: TimeEntriesState,
    action: TimeEntriesAction,
) -> TimeEntriesState {
    match action {
        TimeEntriesAction::WeekReceived { offset, entries } => {
            let index = offset as usize;
            if index >= WEEK_COUNT {
                debug!("Ignoring time entries for week offset {}", offset);
                return state;
            }
            let mut weeks = state.weeks;
            weeks[index] = entries;
            TimeEntriesState { weeks, ..state }
        }
        TimeEntriesAction::PeriodReceived(period) => TimeEntriesState { period, ..state },
    }
}

#[cfg(test)]
mod tests {
    use super::{
        projects_reducer, time_entries_reducer, ProjectsAction, ProjectsState, TimeEntriesAction,
        TimeEntriesState,
    };
    use crate::project::UserProject;
    use crate::time_entry::tests::dummy_entry;

    fn project() -> UserProject {
        UserProject {
            project_id: "p1".to_string(),
            project_name: "Project One".to_string(),
        }
    }

    #[test]
    fn test_projects_initial_state() {
        let state = ProjectsState::default();

        assert!(!state.fetching);
        assert!(!state.fetched);
        assert!(state.projects.is_empty());
        assert_eq!(state.status, "404");
    }

    #[test]
    fn test_projects_fetch_lifecycle() {
        let state = projects_reducer(ProjectsState::default(), ProjectsAction::FetchStart);
        assert!(state.fetching);

        let state = projects_reducer(state, ProjectsAction::Receive(vec![project()]));
        assert!(!state.fetching);
        assert!(state.fetched);
        assert_eq!(state.projects, vec![project()]);
    }

    /// エラー時は取得済みのプロジェクトを保持したままステータスを更新することを確認する。
    #[test]
    fn test_projects_fetch_error_keeps_projects() {
        let state = projects_reducer(
            ProjectsState::default(),
            ProjectsAction::Receive(vec![project()]),
        );
        let state = projects_reducer(state, ProjectsAction::FetchStart);
        let state = projects_reducer(state, ProjectsAction::FetchError("500".to_string()));

        assert!(!state.fetching);
        assert!(state.fetched);
        assert_eq!(state.status, "500");
        assert_eq!(state.projects.len(), 1);
    }

    #[test]
    fn test_time_entries_week_received() {
        let entries = vec![dummy_entry("e1", "p1", 1, 0, true)];

        let state = time_entries_reducer(
            TimeEntriesState::default(),
            TimeEntriesAction::WeekReceived {
                offset: 1,
                entries: entries.clone(),
            },
        );

        assert!(state.weeks[0].is_empty());
        assert_eq!(state.weeks[1], entries);
        assert!(state.weeks[2].is_empty());
        assert!(state.period.is_empty());
    }

    #[test]
    fn test_time_entries_week_out_of_range() {
        let state = time_entries_reducer(
            TimeEntriesState::default(),
            TimeEntriesAction::WeekReceived {
                offset: 3,
                entries: vec![dummy_entry("e1", "p1", 1, 0, true)],
            },
        );

        assert_eq!(state, TimeEntriesState::default());
    }

    #[test]
    fn test_time_entries_period_received() {
        let entries = vec![dummy_entry("e1", "p1", 1, 0, true)];

        let state = time_entries_reducer(
            TimeEntriesState::default(),
            TimeEntriesAction::PeriodReceived(entries.clone()),
        );

        assert_eq!(state.period, entries);
    }
}
