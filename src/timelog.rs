use std::fmt;

use anyhow::{ensure, Context, Result};
use log::{debug, info, warn};

use crate::datetime::{self, DateRange};
use crate::filter::{
    build_filter_options, filter_time_entries, FilterOption, ProjectFilterSelection,
};
use crate::permissions::{
    has_permission, Role, ADD_TIME_ENTRY_OTHERS, DISABLED_DATA_TIMELOG, EDIT_TIMELOG_INFO,
};
use crate::project::Task;
use crate::reducers::{
    projects_reducer, time_entries_reducer, ProjectsAction, ProjectsState, TimeEntriesAction,
    TimeEntriesState, WEEK_COUNT,
};
use crate::session::Session;
use crate::time_entry::{calculate_total_time, TimeEntry};
use crate::timelog_api::TimelogRepository;
use crate::user_profile::UserProfile;

/// 初期表示をタスクのタブにするロール。
const ELEVATED_ROLES: [&str; 4] = ["Administrator", "Manager", "Mentor", "Owner"];

/// timelogのタブ。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelogTab {
    Tasks = 0,
    CurrentWeek = 1,
    LastWeek = 2,
    WeekBeforeLast = 3,
    CustomRange = 4,
}

impl TimelogTab {
    pub const ALL: [TimelogTab; 5] = [
        TimelogTab::Tasks,
        TimelogTab::CurrentWeek,
        TimelogTab::LastWeek,
        TimelogTab::WeekBeforeLast,
        TimelogTab::CustomRange,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.index() == index)
    }

    /// 週のタブの場合は何週前かを返す。
    pub fn week_offset(self) -> Option<u32> {
        match self {
            TimelogTab::CurrentWeek => Some(0),
            TimelogTab::LastWeek => Some(1),
            TimelogTab::WeekBeforeLast => Some(2),
            TimelogTab::Tasks | TimelogTab::CustomRange => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimelogTab::Tasks => "Tasks",
            TimelogTab::CurrentWeek => "Current Week Timelog",
            TimelogTab::LastWeek => "Last Week",
            TimelogTab::WeekBeforeLast => "Week Before Last",
            TimelogTab::CustomRange => "Search by Date Range",
        }
    }

    /// 読み込み完了後に表示するタブを決める。
    ///
    /// 管理者等のロール、またはWBSに属するタスクを持つ場合はタスクのタブ、それ以外は今週のタブとする。
    ///
    /// # Arguments
    ///
    /// * `role` - 閲覧者のロール
    /// * `tasks` - 閲覧対象のユーザーのタスク
    pub fn initial(role: &str, tasks: &[Task]) -> Self {
        if ELEVATED_ROLES.contains(&role) || tasks.iter().any(Task::has_wbs) {
            TimelogTab::Tasks
        } else {
            TimelogTab::CurrentWeek
        }
    }
}

impl fmt::Display for TimelogTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// サマリーバーに表示する今週のtangible時間。
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryBarData {
    pub person_id: String,
    pub tangible_time: f64,
}

/// time entryの追加ボタン。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddEntryAffordance {
    /// 自分のtimelogにintangibleな時間を追加する。
    Intangible,
    /// 他のユーザーのtimelogに時間を追加する。
    ForUser { full_name: String },
}

impl AddEntryAffordance {
    pub fn label(&self) -> String {
        match self {
            AddEntryAffordance::Intangible => "Add Intangible Time Entry".to_string(),
            AddEntryAffordance::ForUser { full_name } => {
                format!("Add Time Entry for {}", full_name)
            }
        }
    }
}

/// 閲覧者の権限で利用できる操作。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelogAffordances {
    pub add_entry: Option<AddEntryAffordance>,
    pub can_edit_info: bool,
    pub entry_form_disabled: bool,
}

/// 描画用のtimelogのスナップショット。
#[derive(Clone, Debug, PartialEq)]
pub struct TimelogPage {
    /// ダッシュボードに埋め込む場合は`None`。
    pub summary_bar: Option<SummaryBarData>,
    pub full_name: String,
    pub is_active: Option<bool>,
    pub is_loading: bool,
    pub active_tab: TimelogTab,
    pub viewing_range: Option<DateRange>,
    pub time_entries: Vec<TimeEntry>,
    pub tangible_time: f64,
    pub intangible_time: f64,
    pub tasks: Vec<Task>,
    pub filter_options: Vec<FilterOption>,
    pub projects_selected: ProjectFilterSelection,
    pub affordances: TimelogAffordances,
    pub error: Option<String>,
}

/// 画面の入力状態。
#[derive(Clone, Debug, PartialEq)]
struct TimelogState {
    active_tab: TimelogTab,
    projects_selected: ProjectFilterSelection,
    period: DateRange,
    is_loading: bool,
}

impl TimelogState {
    fn initial() -> Self {
        Self {
            active_tab: TimelogTab::CurrentWeek,
            projects_selected: ProjectFilterSelection::all(),
            period: DateRange::for_week(0),
            is_loading: true,
        }
    }
}

/// 絞り込み済みのtime entry。
#[derive(Clone, Debug, Default)]
struct FilteredEntries {
    weeks: [Vec<TimeEntry>; WEEK_COUNT],
    period: Vec<TimeEntry>,
}

/// ユーザーのtimelog画面。
///
/// 取得したデータと入力状態を保持し、入力が変わるたびに絞り込み結果を再計算する。
pub struct TimelogView<'a, R: TimelogRepository> {
    session: &'a Session,
    repository: &'a R,
    is_dashboard: bool,
    user_id: String,
    state: TimelogState,
    user_profile: Option<UserProfile>,
    time_entries: TimeEntriesState,
    projects: ProjectsState,
    roles: Vec<Role>,
    tasks: Vec<Task>,
    filtered: FilteredEntries,
    filter_options: Vec<FilterOption>,
    summary_bar: Option<SummaryBarData>,
    error: Option<anyhow::Error>,
}

impl<'a, R: TimelogRepository> TimelogView<'a, R> {
    /// 新しい`TimelogView`を返す。
    ///
    /// # Arguments
    ///
    /// * `session` - ログイン中のセッション
    /// * `repository` - timelog APIと通信するためのリポジトリ
    /// * `target_user` - 閲覧対象のユーザー。`None`の場合はログインユーザー
    /// * `is_dashboard` - ダッシュボードに埋め込む場合は`true`
    pub fn new(
        session: &'a Session,
        repository: &'a R,
        target_user: Option<String>,
        is_dashboard: bool,
    ) -> Self {
        let user_id = resolve_user_id(session, target_user.as_deref());

        Self {
            session,
            repository,
            is_dashboard,
            user_id,
            state: TimelogState::initial(),
            user_profile: None,
            time_entries: TimeEntriesState::default(),
            projects: ProjectsState::default(),
            roles: vec![],
            tasks: vec![],
            filtered: FilteredEntries::default(),
            filter_options: vec![],
            summary_bar: None,
            error: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn active_tab(&self) -> TimelogTab {
        self.state.active_tab
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    /// 読み込み時に発生したエラー。どの取得で失敗したかは区別しない。
    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.as_ref()
    }

    pub fn user_profile(&self) -> Option<&UserProfile> {
        self.user_profile.as_ref()
    }

    pub fn projects(&self) -> &ProjectsState {
        &self.projects
    }

    pub fn summary_bar_data(&self) -> Option<&SummaryBarData> {
        self.summary_bar.as_ref()
    }

    pub fn is_owner(&self) -> bool {
        self.session.user.userid == self.user_id
    }

    /// 閲覧対象のユーザーのデータを読み込む。
    ///
    /// 3週分と期間指定のtime entry、プロジェクト、ロール、タスクを並行して取得し、すべて完了するまで待つ。
    /// 失敗した取得があっても成功した分は反映し、エラーは1つだけ保持する。再試行は行わない。
    pub async fn load(&mut self) {
        self.state.is_loading = true;
        let user_id = self.user_id.clone();
        info!("Loading timelog of {}", user_id);

        if self.user_profile.as_ref().map(|profile| profile.id.as_str()) != Some(user_id.as_str()) {
            let profile = self.repository.read_user_profile(&user_id).await;
            if let Some(profile) = self.settle(profile) {
                self.user_profile = Some(profile);
            }
        }

        self.projects = projects_reducer(
            std::mem::take(&mut self.projects),
            ProjectsAction::FetchStart,
        );
        let repository = self.repository;
        let period = self.state.period;
        let (current_week, last_week, week_before_last, period_entries, projects, roles, tasks) =
            tokio::join!(
                repository.read_week_time_entries(&user_id, 0),
                repository.read_week_time_entries(&user_id, 1),
                repository.read_week_time_entries(&user_id, 2),
                repository.read_time_entries(&user_id, period.start, period.end),
                repository.read_user_projects(&user_id),
                repository.read_roles(),
                repository.read_user_tasks(&user_id),
            );

        for (offset, result) in (0..).zip([current_week, last_week, week_before_last]) {
            if let Some(entries) = self.settle(result) {
                self.dispatch(TimeEntriesAction::WeekReceived { offset, entries });
            }
        }
        if let Some(entries) = self.settle(period_entries) {
            self.dispatch(TimeEntriesAction::PeriodReceived(entries));
        }
        let action = match projects {
            Ok(projects) => ProjectsAction::Receive(projects),
            Err(err) => {
                let status = error_status(&err);
                self.record_error(err);
                ProjectsAction::FetchError(status)
            }
        };
        self.projects = projects_reducer(std::mem::take(&mut self.projects), action);
        if let Some(roles) = self.settle(roles) {
            self.roles = roles;
        }
        if let Some(tasks) = self.settle(tasks) {
            self.tasks = tasks;
        }

        self.state.is_loading = false;
        self.state.active_tab = TimelogTab::initial(&self.session.user.role, &self.tasks);
        self.recompute();
        self.make_bar_data();
        info!("Timelog of {} loaded", user_id);
    }

    /// タブを切り替える。
    pub fn change_tab(&mut self, tab: TimelogTab) {
        debug!("Change tab from {} to {}", self.state.active_tab, tab);
        self.state.active_tab = tab;
    }

    /// プロジェクト、タスクの絞り込みを変更する。
    pub fn select_projects(&mut self, selection: ProjectFilterSelection) {
        self.state.projects_selected = selection;
        self.recompute();
    }

    /// 指定した期間のtime entryを取得し直す。
    pub async fn search_period(&mut self, range: DateRange) -> Result<()> {
        ensure!(
            range.start <= range.end,
            "From date {} is after to date {}",
            range.start,
            range.end
        );
        let entries = self
            .repository
            .read_time_entries(&self.user_id, range.start, range.end)
            .await
            .with_context(|| format!("Failed to search time entries from {}", range))?;
        // 取得に失敗した場合は表示中の期間とtime entryをそのまま残す
        self.state.period = range;
        self.dispatch(TimeEntriesAction::PeriodReceived(entries));
        self.recompute();

        Ok(())
    }

    /// 閲覧対象のユーザーを変更し、初期状態から読み込み直す。
    pub async fn change_viewed_user(&mut self, target_user: Option<String>) {
        self.user_id = resolve_user_id(self.session, target_user.as_deref());
        self.state = TimelogState::initial();
        self.user_profile = None;
        self.time_entries = TimeEntriesState::default();
        self.projects = ProjectsState::default();
        self.roles.clear();
        self.tasks.clear();
        self.summary_bar = None;
        self.error = None;
        self.load().await;
    }

    /// 閲覧対象のユーザーの稼働状態を切り替える。
    ///
    /// 停止する場合は今日を終了日とし、再開する場合は終了日を消す。
    pub async fn toggle_user_active(&mut self) -> Result<()> {
        let mut profile = self
            .user_profile
            .clone()
            .context("User profile is not loaded")?;
        ensure!(
            profile.id == self.user_id,
            "Loaded profile {} does not belong to {}",
            profile.id,
            self.user_id
        );
        profile.is_active = !profile.is_active;
        profile.end_date = (!profile.is_active).then(datetime::today);
        self.repository
            .update_user_profile(&profile)
            .await
            .context("Failed to toggle active status")?;
        let status = if profile.is_active {
            "active"
        } else {
            "inactive"
        };
        info!("{} is now {}", profile.full_name(), status);
        self.user_profile = Some(profile);

        Ok(())
    }

    /// 閲覧者の権限で利用できる操作を返す。
    pub fn affordances(&self) -> TimelogAffordances {
        let user = &self.session.user;
        let user_permissions = &user.permissions.front_permissions;
        let add_entry = if self.is_owner() {
            Some(AddEntryAffordance::Intangible)
        } else if has_permission(&user.role, ADD_TIME_ENTRY_OTHERS, &self.roles, user_permissions) {
            Some(AddEntryAffordance::ForUser {
                full_name: self.full_name(),
            })
        } else {
            None
        };

        let granted =
            |permission| has_permission(&user.role, permission, &self.roles, user_permissions);

        TimelogAffordances {
            add_entry,
            can_edit_info: granted(EDIT_TIMELOG_INFO),
            entry_form_disabled: granted(DISABLED_DATA_TIMELOG),
        }
    }

    /// 現在の状態から描画用のスナップショットを作成する。
    pub fn page(&self) -> TimelogPage {
        let tab = self.state.active_tab;
        let (viewing_range, time_entries) = match tab {
            TimelogTab::Tasks => (None, vec![]),
            TimelogTab::CustomRange => (Some(self.state.period), self.filtered.period.clone()),
            TimelogTab::CurrentWeek | TimelogTab::LastWeek | TimelogTab::WeekBeforeLast => {
                let offset = tab.week_offset().unwrap_or_default();
                (
                    Some(DateRange::for_week(offset)),
                    self.filtered.weeks[offset as usize].clone(),
                )
            }
        };
        let tasks = match tab {
            TimelogTab::Tasks => self.tasks.clone(),
            _ => vec![],
        };

        TimelogPage {
            summary_bar: if self.is_dashboard {
                None
            } else {
                self.summary_bar.clone()
            },
            full_name: self.full_name(),
            is_active: self.user_profile.as_ref().map(|profile| profile.is_active),
            is_loading: self.state.is_loading,
            active_tab: tab,
            viewing_range,
            tangible_time: calculate_total_time(&time_entries, true),
            intangible_time: calculate_total_time(&time_entries, false),
            time_entries,
            tasks,
            filter_options: self.filter_options.clone(),
            projects_selected: self.state.projects_selected.clone(),
            affordances: self.affordances(),
            error: self.error.as_ref().map(|err| format!("{:#}", err)),
        }
    }

    fn full_name(&self) -> String {
        self.user_profile
            .as_ref()
            .map(UserProfile::full_name)
            .unwrap_or_else(|| self.user_id.clone())
    }

    fn dispatch(&mut self, action: TimeEntriesAction) {
        self.time_entries = time_entries_reducer(std::mem::take(&mut self.time_entries), action);
    }

    /// 取得したtime entryと絞り込みから表示用のtime entryと選択肢を作り直す。
    fn recompute(&mut self) {
        let selection = &self.state.projects_selected;
        let weeks = &self.time_entries.weeks;
        self.filtered = FilteredEntries {
            weeks: std::array::from_fn(|index| filter_time_entries(&weeks[index], selection)),
            period: filter_time_entries(&self.time_entries.period, selection),
        };
        self.filter_options = build_filter_options(
            &self.projects.projects,
            &self.tasks,
            &self.session.user.userid,
        );
    }

    fn make_bar_data(&mut self) {
        let tangible_time = calculate_total_time(&self.time_entries.weeks[0], true);
        self.summary_bar = Some(SummaryBarData {
            person_id: self.user_id.clone(),
            tangible_time,
        });
    }

    fn settle<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.record_error(err);
                None
            }
        }
    }

    /// 最初に発生したエラーのみを保持する。
    fn record_error(&mut self, err: anyhow::Error) {
        warn!("Failed to load timelog: {:#}", err);
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

fn resolve_user_id(session: &Session, target_user: Option<&str>) -> String {
    target_user
        .filter(|user_id| !user_id.is_empty())
        .unwrap_or(&session.user.userid)
        .to_string()
}

/// エラーの原因となったHTTPステータスを返す。
fn error_status(err: &anyhow::Error) -> String {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .and_then(reqwest::Error::status)
        .map(|status| status.as_u16().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
