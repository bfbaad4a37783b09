use chrono::NaiveDate;

use crate::user_profile::{UserProfile, UserStatus};

const PAUSE: &str = "Pause";
const RESUME: &str = "Resume";
const DELETE: &str = "Delete";

/// ユーザー一覧の1行。
#[derive(Clone, Debug, PartialEq)]
pub struct UserTableRow {
    pub index: usize,
    pub user: UserProfile,
    is_changing: bool,
}

impl UserTableRow {
    pub fn new(index: usize, user: UserProfile) -> Self {
        Self {
            index,
            user,
            is_changing: false,
        }
    }

    /// 稼働状態を変更中にする。新しい状態で作り直されるまで表示が変わる。
    pub fn mark_changing(&mut self) {
        self.is_changing = true;
    }

    /// 稼働状態の表示。
    pub fn active_cell(&self) -> &'static str {
        if self.user.is_active {
            "●"
        } else {
            "○"
        }
    }

    /// 一時停止、再開ボタンの表示。
    pub fn pause_resume_label(&self) -> &'static str {
        if self.is_changing {
            "..."
        } else if self.user.is_active {
            PAUSE
        } else {
            RESUME
        }
    }

    /// ボタンを押した時に変更する状態。
    pub fn pause_resume_target(&self) -> UserStatus {
        if self.user.is_active {
            UserStatus::InActive
        } else {
            UserStatus::Active
        }
    }

    /// 停止中のユーザーの再開予定日。
    pub fn reactivation_date(&self) -> Option<NaiveDate> {
        if self.user.is_active {
            return None;
        }
        self.user.reactivation_date.map(|date| date.date_naive())
    }

    pub fn delete_label(&self) -> &'static str {
        DELETE
    }
}

/// ユーザーのプロフィールから一覧の行を作成する。
pub fn build_rows(users: Vec<UserProfile>) -> Vec<UserTableRow> {
    users
        .into_iter()
        .enumerate()
        .map(|(index, user)| UserTableRow::new(index, user))
        .collect()
}
