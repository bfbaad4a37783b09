use std::collections::BTreeSet;

use crate::project::{Task, UserProject};
use crate::time_entry::TimeEntry;

/// すべてのプロジェクトとタスクを表す選択値。
pub const ALL: &str = "all";

/// 選択されたプロジェクト、タスクのID。
///
/// `"all"`を含む場合はプロジェクトによる絞り込みを行わない。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectFilterSelection {
    selected: BTreeSet<String>,
}

impl Default for ProjectFilterSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl ProjectFilterSelection {
    /// `"all"`のみを選択した状態を返す。
    pub fn all() -> Self {
        Self::from_ids([ALL])
    }

    /// 指定したIDを選択した状態を返す。
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains_all(&self) -> bool {
        self.selected.contains(ALL)
    }

    /// 選択肢として選ばれているかどうか。`"all"`による包含は考慮しない。
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// プロジェクトが表示対象かどうか。
    pub fn includes(&self, project_id: &str) -> bool {
        self.contains_all() || self.selected.contains(project_id)
    }
}

/// 選択されたプロジェクトのtime entryのみを残す。
///
/// 順序はAPIから取得した順序のまま保持する。
pub fn filter_time_entries(
    time_entries: &[TimeEntry],
    selection: &ProjectFilterSelection,
) -> Vec<TimeEntry> {
    if selection.contains_all() {
        return time_entries.to_vec();
    }

    time_entries
        .iter()
        .filter(|entry| selection.includes(&entry.project_id))
        .cloned()
        .collect()
}

/// プロジェクト、タスクの絞り込みの選択肢。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// 絞り込みの選択肢を作成する。
///
/// 先頭は`"all"`、続いてプロジェクト、閲覧者に未完了で割り当てられているタスクの順に並べる。
pub fn build_filter_options(
    projects: &[UserProject],
    tasks: &[Task],
    viewer_id: &str,
) -> Vec<FilterOption> {
    let all = FilterOption {
        value: ALL.to_string(),
        label: "All Projects and Tasks (Default)".to_string(),
    };
    let project_options = projects.iter().map(|project| FilterOption {
        value: project.project_id.clone(),
        label: project.project_name.clone(),
    });
    let task_options = tasks
        .iter()
        .filter(|task| task.is_active_for(viewer_id))
        .map(|task| FilterOption {
            value: task.id.clone(),
            label: task.task_name.clone(),
        });

    std::iter::once(all)
        .chain(project_options)
        .chain(task_options)
        .collect()
}
