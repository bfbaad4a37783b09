use std::io::Write;

use anyhow::{Context, Result};

use crate::timelog::{TimelogPage, TimelogTab};
use crate::user_management::UserTableRow;

/// Consoleにtimelogやユーザー一覧を表示するためのtrait。
pub trait ConsolePresenter {
    /// timelogを表示する。
    ///
    /// # Arguments
    ///
    /// * `page` - 表示するtimelogのスナップショット
    fn show_timelog(&mut self, page: &TimelogPage) -> Result<()>;

    /// ユーザー一覧を表示する。
    fn show_user_rows(&mut self, rows: &[UserTableRow]) -> Result<()>;
}

/// Markdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    fn show_header(&mut self, page: &TimelogPage) -> Result<()> {
        if let Some(summary_bar) = &page.summary_bar {
            writeln!(
                self.writer,
                "> {}: {:.2} tangible hours this week",
                summary_bar.person_id, summary_bar.tangible_time
            )?;
        }
        let status = match page.is_active {
            Some(true) => " (active)",
            Some(false) => " (inactive)",
            None => "",
        };
        writeln!(self.writer, "# Tasks and Timelogs: {}{}", page.full_name, status)?;
        let affordances = &page.affordances;
        if let Some(add_entry) = &affordances.add_entry {
            let disabled = if affordances.entry_form_disabled {
                " (disabled)"
            } else {
                ""
            };
            writeln!(self.writer, "[{}]{}", add_entry.label(), disabled)?;
        }
        if affordances.can_edit_info {
            writeln!(self.writer, "[Edit Timelog Info]")?;
        }
        if let Some(error) = &page.error {
            writeln!(self.writer, "! {}", error)?;
        }

        let tabs: Vec<String> = TimelogTab::ALL
            .iter()
            .map(|tab| {
                if *tab == page.active_tab {
                    format!("**{}**", tab)
                } else {
                    tab.to_string()
                }
            })
            .collect();
        writeln!(self.writer, "{}", tabs.join(" | "))?;

        Ok(())
    }

    /// 絞り込みの選択肢を表示する。選択中のものには`*`を付ける。
    fn show_filter_options(&mut self, page: &TimelogPage) -> Result<()> {
        if page.filter_options.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "Filter by project or task (-p):")?;
        for option in &page.filter_options {
            let mark = if page.projects_selected.is_selected(&option.value) {
                "*"
            } else {
                " "
            };
            writeln!(self.writer, "{} {}: {}", mark, option.value, option.label)?;
        }

        Ok(())
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // timelogをlist形式で表示する。
    fn show_timelog(&mut self, page: &TimelogPage) -> Result<()> {
        if page.is_loading {
            writeln!(self.writer, "Loading...").context("Failed to write loading indicator")?;
            return Ok(());
        }
        self.show_header(page).context("Failed to write timelog header")?;

        if page.active_tab == TimelogTab::Tasks {
            for task in &page.tasks {
                let wbs = task.wbs_id.as_deref().unwrap_or("-");
                writeln!(self.writer, "- [{}] {}", wbs, task.task_name)
                    .with_context(|| format!("Failed to write task: {:?}", task))?;
            }
            return Ok(());
        }

        self.show_filter_options(page)
            .context("Failed to write filter options")?;
        if let Some(range) = &page.viewing_range {
            writeln!(self.writer, "Viewing time Entries from {}", range)
                .context("Failed to write range")?;
        }
        for entry in &page.time_entries {
            let kind = if entry.is_tangible {
                "tangible"
            } else {
                "intangible"
            };
            writeln!(
                self.writer,
                "- {} {}:{:02} ({}) [{}]: {}",
                entry.date_of_work.format("%m/%d"),
                entry.hours,
                entry.minutes,
                kind,
                entry.project_id,
                entry.notes
            )
            .with_context(|| format!("Failed to write time entry: {:?}", entry))?;
        }
        writeln!(
            self.writer,
            "Tangible: {:.2} / Intangible: {:.2}",
            page.tangible_time, page.intangible_time
        )
        .context("Failed to write totals")?;

        Ok(())
    }

    // ユーザーを1行ずつ表示する。
    fn show_user_rows(&mut self, rows: &[UserTableRow]) -> Result<()> {
        for row in rows {
            let reactivation = row
                .reactivation_date()
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            writeln!(
                self.writer,
                "- {} {} {} | {} | {} | {} | {} | [{}] {} [{}]",
                row.active_cell(),
                row.user.first_name,
                row.user.last_name,
                row.user.role,
                row.user.email,
                row.user.weekly_comitted_hours,
                row.user.id,
                row.pause_resume_label(),
                reactivation,
                row.delete_label()
            )
            .with_context(|| format!("Failed to write user: {}", row.user.id))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;

    use super::ConsoleMarkdownList;
    use super::ConsolePresenter;
    use crate::datetime::DateRange;
    use crate::filter::{FilterOption, ProjectFilterSelection};
    use crate::project::tests::dummy_task;
    use crate::time_entry::tests::dummy_entry;
    use crate::timelog::{
        AddEntryAffordance, SummaryBarData, TimelogAffordances, TimelogPage, TimelogTab,
    };
    use crate::user_management::build_rows;
    use crate::user_profile::tests::dummy_profile;

    /// テスト用にダミーのTimelogPageを作成する。
    fn dummy_page(active_tab: TimelogTab) -> TimelogPage {
        TimelogPage {
            summary_bar: Some(SummaryBarData {
                person_id: "u1".to_string(),
                tangible_time: 1.5,
            }),
            full_name: "Jane Doe".to_string(),
            is_active: Some(true),
            is_loading: false,
            active_tab,
            viewing_range: Some(DateRange {
                start: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 5, 18).unwrap(),
            }),
            time_entries: vec![
                dummy_entry("e1", "p1", 1, 30, true),
                dummy_entry("e2", "p2", 0, 5, false),
            ],
            tangible_time: 1.5,
            intangible_time: 0.083,
            tasks: vec![dummy_task("t1", Some("w1"), &[])],
            filter_options: vec![
                FilterOption {
                    value: "all".to_string(),
                    label: "All Projects and Tasks (Default)".to_string(),
                },
                FilterOption {
                    value: "p1".to_string(),
                    label: "Project One".to_string(),
                },
            ],
            projects_selected: ProjectFilterSelection::all(),
            affordances: TimelogAffordances {
                add_entry: Some(AddEntryAffordance::Intangible),
                can_edit_info: false,
                entry_form_disabled: false,
            },
            error: None,
        }
    }

    fn render(page: &TimelogPage) -> String {
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);

        presenter.show_timelog(page).unwrap();

        String::from_utf8(writer).unwrap()
    }

    #[test]
    fn test_show_timelog_week() {
        let expected = [
            "> u1: 1.50 tangible hours this week",
            "# Tasks and Timelogs: Jane Doe (active)",
            "[Add Intangible Time Entry]",
            "Tasks | **Current Week Timelog** | Last Week | Week Before Last | Search by Date Range",
            "Filter by project or task (-p):",
            "* all: All Projects and Tasks (Default)",
            "  p1: Project One",
            "Viewing time Entries from 2024-05-12 to 2024-05-18",
            "- 05/13 1:30 (tangible) [p1]: notes of e1",
            "- 05/13 0:05 (intangible) [p2]: notes of e2",
            "Tangible: 1.50 / Intangible: 0.08",
            "",
        ]
        .join("\n");

        assert_eq!(render(&dummy_page(TimelogTab::CurrentWeek)), expected);
    }

    #[test]
    fn test_show_timelog_selected_project_and_affordances() {
        let mut page = dummy_page(TimelogTab::CustomRange);
        page.projects_selected = ProjectFilterSelection::from_ids(["p1"]);
        page.affordances = TimelogAffordances {
            add_entry: Some(AddEntryAffordance::ForUser {
                full_name: "Jane Doe".to_string(),
            }),
            can_edit_info: true,
            entry_form_disabled: true,
        };

        let output = render(&page);

        assert!(output.contains("[Add Time Entry for Jane Doe] (disabled)\n[Edit Timelog Info]\n"));
        assert!(output.contains("  all: All Projects and Tasks (Default)\n* p1: Project One\n"));
    }

    #[test]
    fn test_show_timelog_tasks() {
        let output = render(&dummy_page(TimelogTab::Tasks));

        assert!(output.contains("**Tasks** | Current Week Timelog"));
        assert!(output.ends_with("- [w1] task t1\n"));
        assert!(!output.contains("Viewing time Entries"));
        assert!(!output.contains("Filter by project or task"));
    }

    #[rstest]
    #[case::current_week(TimelogTab::CurrentWeek)]
    #[case::tasks(TimelogTab::Tasks)]
    fn test_show_timelog_loading(#[case] active_tab: TimelogTab) {
        let mut page = dummy_page(active_tab);
        page.is_loading = true;

        assert_eq!(render(&page), "Loading...\n");
    }

    #[test]
    fn test_show_timelog_dashboard_with_error() {
        let mut page = dummy_page(TimelogTab::LastWeek);
        page.summary_bar = None;
        page.error = Some("roles unavailable".to_string());

        let output = render(&page);

        assert!(output.starts_with("# Tasks and Timelogs"));
        assert!(output.contains("! roles unavailable\n"));
    }

    #[test]
    fn test_show_user_rows() {
        let rows = build_rows(vec![dummy_profile("u1", true), dummy_profile("u2", false)]);
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);

        presenter.show_user_rows(&rows).unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            [
                "- ● Jane Doe | Volunteer | u1@example.com | 10 | u1 | [Pause]  [Delete]",
                "- ○ Jane Doe | Volunteer | u2@example.com | 10 | u2 | [Resume]  [Delete]",
                "",
            ]
            .join("\n")
        );
    }
}
