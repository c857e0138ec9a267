use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::record;
use crate::error::AppError;
use crate::model::{PlanRecord, Rank};

pub const HISTORY_LIMIT: usize = 14;
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

pub struct App {
    db: DatabaseConnection,
    today: NaiveDate,
}

pub struct HistoryEntry {
    pub date: String,
    pub record: PlanRecord,
}

impl App {
    pub fn new(db: DatabaseConnection, today: NaiveDate) -> Self {
        Self { db, today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn today_key(&self) -> String {
        self.today.format(DATE_KEY_FORMAT).to_string()
    }

    pub async fn load_today(&self) -> Result<PlanRecord, AppError> {
        let row = record::Entity::find_by_id(self.today_key())
            .one(&self.db)
            .await?;
        // An absent row and an unparsable one both mean a fresh day.
        Ok(row
            .and_then(|row| serde_json::from_str(&row.data).ok())
            .unwrap_or_default())
    }

    pub async fn save_today(&self, record: &PlanRecord) {
        // Write failures are dropped; the in-memory record stays authoritative.
        let _ = self.try_save_today(record).await;
    }

    async fn try_save_today(&self, record: &PlanRecord) -> Result<(), AppError> {
        let key = self.today_key();
        let data = serde_json::to_string(record)?;
        let existing = record::Entity::find_by_id(key.clone()).one(&self.db).await?;
        match existing {
            Some(row) => {
                let mut active: record::ActiveModel = row.into();
                active.data = Set(data);
                active.update(&self.db).await?;
            }
            None => {
                let active = record::ActiveModel {
                    date: Set(key),
                    data: Set(data),
                };
                record::Entity::insert(active).exec(&self.db).await?;
            }
        }
        Ok(())
    }

    pub async fn load_history(&self) -> Result<Vec<HistoryEntry>, AppError> {
        let rows = record::Entity::find()
            .filter(record::Column::Date.ne(self.today_key()))
            .order_by_desc(record::Column::Date)
            .all(&self.db)
            .await?;
        let mut entries: Vec<HistoryEntry> = rows
            .into_iter()
            .filter_map(|row| {
                let record = serde_json::from_str(&row.data).ok()?;
                Some(HistoryEntry {
                    date: row.date,
                    record,
                })
            })
            .collect();
        entries.truncate(HISTORY_LIMIT);
        Ok(entries)
    }

    pub async fn add_task(&self, text: &str) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.add_task(text)).await
    }

    pub async fn remove_task(&self, index: usize) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.remove_task(index)).await
    }

    pub async fn update_task(&self, index: usize, text: &str) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.update_task(index, text)).await
    }

    pub async fn move_task(&self, from: usize, to: usize) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.move_task(from, to)).await
    }

    pub async fn toggle_pick(&self, index: usize) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.toggle_pick(index)).await
    }

    pub async fn move_pick(&self, from: usize, to: usize) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.move_pick(from, to)).await
    }

    pub async fn advance(&self) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.advance()).await
    }

    pub async fn go_back(&self) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.go_back()).await
    }

    pub async fn choose_rank(&self, rank: Rank) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.choose_rank(rank)).await
    }

    pub async fn restart(&self) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.restart()).await
    }

    pub async fn set_expanded(&self, index: usize, open: bool) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.set_expanded(index, open)).await
    }

    pub async fn set_first_step(&self, index: usize, text: &str) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.set_first_step(index, text)).await
    }

    pub async fn set_trick(&self, index: usize, text: &str) -> Result<(PlanRecord, bool), AppError> {
        self.apply(|record| record.set_trick(index, text)).await
    }

    async fn apply<F>(&self, mutate: F) -> Result<(PlanRecord, bool), AppError>
    where
        F: FnOnce(&mut PlanRecord) -> bool,
    {
        let mut record = self.load_today().await?;
        let changed = mutate(&mut record);
        if changed {
            self.save_today(&record).await;
        }
        Ok((record, changed))
    }
}
