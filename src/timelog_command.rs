use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::{info, warn};

use crate::datetime::{parse_date, DateRange};
use crate::filter::ProjectFilterSelection;
use crate::session::Session;
use crate::timelog::{TimelogPage, TimelogTab, TimelogView};
use crate::timelog_api::TimelogRepository;

/// ユーザーのtimelogを表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct TimelogArgs {
    #[clap(short = 'u', long = "user", help = "Shows the timelog of another user")]
    pub user: Option<String>,

    #[clap(
        short = 't',
        long = "tab",
        help = "Sets the tab: tasks, current, last, before-last, range or 0-4",
        parse(try_from_str = parse_tab),
    )]
    pub tab: Option<TimelogTab>,

    #[clap(
        long = "from",
        help = "Searches from a date in the format YYYY-MM-DD",
        requires = "to",
        parse(try_from_str = parse_date),
    )]
    pub from: Option<NaiveDate>,

    #[clap(
        long = "to",
        help = "Searches to a date in the format YYYY-MM-DD",
        requires = "from",
        parse(try_from_str = parse_date),
    )]
    pub to: Option<NaiveDate>,

    #[clap(short = 'p', long = "project", help = "Filters entries by project or task id")]
    pub projects: Vec<String>,

    #[clap(long = "dashboard", help = "Hands the summary bar to the caller instead of showing it")]
    pub dashboard: bool,

    #[clap(long = "toggle-active", help = "Pauses or resumes the viewed user")]
    pub toggle_active: bool,
}

pub struct TimelogCommand<'a, T: TimelogRepository> {
    session: &'a Session,
    repository: &'a T,
}

impl<'a, T: TimelogRepository> TimelogCommand<'a, T> {
    /// 新しい`TimelogCommand`を返す。
    ///
    /// # Arguments
    /// * `session` - ログイン中のセッション
    /// * `repository` - timelog APIと通信するためのリポジトリ
    pub fn new(session: &'a Session, repository: &'a T) -> Self {
        Self { session, repository }
    }

    /// `timelog`サブコマンドの処理を行う。
    ///
    /// 3週分と期間指定のtime entryを読み込み、指定されたタブと絞り込みで表示する内容を返す。
    /// 期間が指定された場合は、その期間で検索し直して期間指定のタブを表示する。
    ///
    /// # Arguments
    ///
    /// * `args` - `timelog`サブコマンドの引数
    pub async fn run(&self, args: TimelogArgs) -> Result<TimelogPage> {
        let mut view = TimelogView::new(self.session, self.repository, args.user, args.dashboard);
        view.load().await;
        if let Some(err) = view.error() {
            warn!("Showing partially loaded timelog: {:#}", err);
        }

        if args.toggle_active {
            view.toggle_user_active().await?;
        }
        if let (Some(from), Some(to)) = (args.from, args.to) {
            let range = DateRange {
                start: from,
                end: to,
            };
            view.search_period(range)
                .await
                .context("Failed to search by date range")?;
            view.change_tab(TimelogTab::CustomRange);
        }
        if let Some(tab) = args.tab {
            view.change_tab(tab);
        }
        if !args.projects.is_empty() {
            view.select_projects(ProjectFilterSelection::from_ids(args.projects));
        }
        if let Some(summary_bar) = view.summary_bar_data().filter(|_| args.dashboard) {
            info!(
                "Summary bar of {}: {:.2} tangible hours",
                summary_bar.person_id, summary_bar.tangible_time
            );
        }

        Ok(view.page())
    }
}

/// タブをパースする。
fn parse_tab(s: &str) -> Result<TimelogTab> {
    let tab = match s {
        "tasks" => TimelogTab::Tasks,
        "current" => TimelogTab::CurrentWeek,
        "last" => TimelogTab::LastWeek,
        "before-last" => TimelogTab::WeekBeforeLast,
        "range" => TimelogTab::CustomRange,
        _ => match s.parse::<u8>().ok().and_then(TimelogTab::from_index) {
            Some(tab) => tab,
            None => bail!("Unknown tab: {}", s),
        },
    };

    Ok(tab)
}
