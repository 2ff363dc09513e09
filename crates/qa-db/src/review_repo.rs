use crate::util::{
    decode_enum, decode_json, encode_enum, encode_json, from_date, from_rfc3339, to_date,
    to_rfc3339, version_from_sql, version_to_sql,
};
use qa_core::error::ReviewError;
use qa_core::reviews::ReviewRepository;
use qa_core::types::{HistoryEntry, Review, ReviewDocument, ReviewFilter, ReviewId};
use rusqlite::types::{FromSql, Value};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

const REVIEW_COLUMNS: &str = "id, member_firm, review_type, review_mode, country, reviewer, reviewer_id, status, acceptance_json, assessment_json, rejection_json, start_date, end_date, due_date, version, created_at, last_updated";

pub struct ReviewRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ReviewRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn stored_version(&self, id: &ReviewId) -> Result<Option<u64>, ReviewError> {
        let version: Option<i64> = self
            .conn
            .query_row(
                "SELECT version FROM reviews WHERE id = ?1",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(ReviewError::storage)?;
        version.map(version_from_sql).transpose().map_err(Into::into)
    }

    fn documents(&self, id: &ReviewId) -> Result<Vec<ReviewDocument>, ReviewError> {
        let mut stmt = self
            .conn
            .prepare("SELECT seq, category, name, location, uploaded_by, uploaded_at FROM review_documents WHERE review_id = ?1 ORDER BY seq ASC")
            .map_err(ReviewError::storage)?;
        let mut rows = stmt.query([id.as_str()]).map_err(ReviewError::storage)?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next().map_err(ReviewError::storage)? {
            let category: String = column(row, 1)?;
            let uploaded_at: String = column(row, 5)?;
            documents.push(ReviewDocument {
                seq: column(row, 0)?,
                category: decode_enum(&category)?,
                name: column(row, 2)?,
                location: column(row, 3)?,
                uploaded_by: column(row, 4)?,
                uploaded_at: from_rfc3339(&uploaded_at)?,
            });
        }
        Ok(documents)
    }

    fn insert_documents(&self, review: &Review, after_seq: u32) -> Result<(), ReviewError> {
        for document in review.documents.iter().filter(|doc| doc.seq > after_seq) {
            self.conn
                .execute(
                    "INSERT INTO review_documents (review_id, seq, category, name, location, uploaded_by, uploaded_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        review.id.as_str(),
                        document.seq,
                        encode_enum(&document.category)?,
                        document.name,
                        document.location,
                        document.uploaded_by,
                        to_rfc3339(&document.uploaded_at),
                    ],
                )
                .map_err(ReviewError::storage)?;
        }
        Ok(())
    }

    fn hydrate(&self, mut review: Review) -> Result<Review, ReviewError> {
        review.history = self.history(&review.id)?;
        review.documents = self.documents(&review.id)?;
        Ok(review)
    }
}

impl<'a> ReviewRepository for ReviewRepo<'a> {
    fn create(&self, review: &Review) -> Result<Review, ReviewError> {
        let mut created = review.clone();
        created.version = 1;
        let sql = format!(
            "INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        );
        self.conn
            .execute(
                &sql,
                params![
                    created.id.as_str(),
                    created.member_firm,
                    encode_enum(&created.review_type)?,
                    encode_enum(&created.review_mode)?,
                    created.country,
                    created.reviewer,
                    created.reviewer_id,
                    encode_enum(&created.status)?,
                    encode_json(&created.acceptance)?,
                    encode_json(&created.assessment)?,
                    created.rejection.as_ref().map(encode_json).transpose()?,
                    to_date(&created.start_date),
                    to_date(&created.end_date),
                    created.due_date.as_ref().map(to_date),
                    version_to_sql(created.version)?,
                    to_rfc3339(&created.created_at),
                    to_rfc3339(&created.last_updated),
                ],
            )
            .map_err(ReviewError::storage)?;
        self.insert_documents(&created, 0)?;
        Ok(created)
    }

    fn get(&self, id: &ReviewId) -> Result<Option<Review>, ReviewError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(ReviewError::storage)?;
        let mut rows = stmt.query([id.as_str()]).map_err(ReviewError::storage)?;
        let Some(row) = rows.next().map_err(ReviewError::storage)? else {
            return Ok(None);
        };
        let review = map_review_row(row)?;
        self.hydrate(review).map(Some)
    }

    fn list(&self, filter: &ReviewFilter) -> Result<Vec<Review>, ReviewError> {
        let mut clauses = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(statuses) = filter.status.as_ref().filter(|s| !s.is_empty()) {
            let mut placeholders = Vec::new();
            for status in statuses {
                values.push(Value::Text(encode_enum(status)?));
                placeholders.push(format!("?{}", values.len()));
            }
            clauses.push(format!("status IN ({})", placeholders.join(", ")));
        }
        if let Some(reviewer_id) = &filter.reviewer_id {
            values.push(Value::Text(reviewer_id.clone()));
            clauses.push(format!("reviewer_id = ?{}", values.len()));
        }
        if let Some(member_firm) = &filter.member_firm {
            values.push(Value::Text(member_firm.clone()));
            clauses.push(format!("member_firm = ?{} COLLATE NOCASE", values.len()));
        }

        let mut sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql).map_err(ReviewError::storage)?;
        let mut rows = stmt
            .query(params_from_iter(values))
            .map_err(ReviewError::storage)?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next().map_err(ReviewError::storage)? {
            let review = map_review_row(row)?;
            // Stage has no column; it is derived from status.
            if filter.matches(&review) {
                reviews.push(review);
            }
        }
        reviews
            .into_iter()
            .map(|review| self.hydrate(review))
            .collect()
    }

    fn save(
        &self,
        review: &Review,
        entry: &HistoryEntry,
        expected_version: u64,
    ) -> Result<Review, ReviewError> {
        let next_version = expected_version + 1;
        let updated = self
            .conn
            .execute(
                "UPDATE reviews SET member_firm = ?1, review_type = ?2, review_mode = ?3, country = ?4, reviewer = ?5, reviewer_id = ?6, status = ?7, acceptance_json = ?8, assessment_json = ?9, rejection_json = ?10, start_date = ?11, end_date = ?12, due_date = ?13, version = ?14, last_updated = ?15 WHERE id = ?16 AND version = ?17",
                params![
                    review.member_firm,
                    encode_enum(&review.review_type)?,
                    encode_enum(&review.review_mode)?,
                    review.country,
                    review.reviewer,
                    review.reviewer_id,
                    encode_enum(&review.status)?,
                    encode_json(&review.acceptance)?,
                    encode_json(&review.assessment)?,
                    review.rejection.as_ref().map(encode_json).transpose()?,
                    to_date(&review.start_date),
                    to_date(&review.end_date),
                    review.due_date.as_ref().map(to_date),
                    version_to_sql(next_version)?,
                    to_rfc3339(&review.last_updated),
                    review.id.as_str(),
                    version_to_sql(expected_version)?,
                ],
            )
            .map_err(ReviewError::storage)?;

        if updated == 0 {
            return match self.stored_version(&review.id)? {
                None => Err(ReviewError::ReviewNotFound),
                Some(actual) => {
                    tracing::debug!(
                        review_id = %review.id,
                        expected = expected_version,
                        actual,
                        "review version conflict"
                    );
                    Err(ReviewError::Conflict {
                        expected: expected_version,
                        actual,
                    })
                }
            };
        }

        self.conn
            .execute(
                "INSERT INTO review_history (review_id, seq, actor, role, from_status, to_status, notes, at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    review.id.as_str(),
                    entry.seq,
                    entry.actor,
                    entry.role.as_ref().map(encode_enum).transpose()?,
                    encode_enum(&entry.from)?,
                    encode_enum(&entry.to)?,
                    entry.notes,
                    to_rfc3339(&entry.at),
                ],
            )
            .map_err(ReviewError::storage)?;

        let stored_docs: Option<u32> = self
            .conn
            .query_row(
                "SELECT MAX(seq) FROM review_documents WHERE review_id = ?1",
                [review.id.as_str()],
                |row| row.get(0),
            )
            .map_err(ReviewError::storage)?;
        self.insert_documents(review, stored_docs.unwrap_or(0))?;

        let mut saved = review.clone();
        saved.version = next_version;
        Ok(saved)
    }

    fn history(&self, id: &ReviewId) -> Result<Vec<HistoryEntry>, ReviewError> {
        let mut stmt = self
            .conn
            .prepare("SELECT seq, actor, role, from_status, to_status, notes, at FROM review_history WHERE review_id = ?1 ORDER BY seq ASC")
            .map_err(ReviewError::storage)?;
        let mut rows = stmt.query([id.as_str()]).map_err(ReviewError::storage)?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().map_err(ReviewError::storage)? {
            let role: Option<String> = column(row, 2)?;
            let from: String = column(row, 3)?;
            let to: String = column(row, 4)?;
            let at: String = column(row, 6)?;
            entries.push(HistoryEntry {
                seq: column(row, 0)?,
                actor: column(row, 1)?,
                role: role.as_deref().map(decode_enum).transpose()?,
                from: decode_enum(&from)?,
                to: decode_enum(&to)?,
                notes: column(row, 5)?,
                at: from_rfc3339(&at)?,
            });
        }
        Ok(entries)
    }
}

fn column<T: FromSql>(row: &Row<'_>, index: usize) -> Result<T, ReviewError> {
    row.get(index).map_err(ReviewError::storage)
}

fn map_review_row(row: &Row<'_>) -> Result<Review, ReviewError> {
    let id: String = column(row, 0)?;
    let review_type: String = column(row, 2)?;
    let review_mode: String = column(row, 3)?;
    let status: String = column(row, 7)?;
    let acceptance: String = column(row, 8)?;
    let assessment: String = column(row, 9)?;
    let rejection: Option<String> = column(row, 10)?;
    let start_date: String = column(row, 11)?;
    let end_date: String = column(row, 12)?;
    let due_date: Option<String> = column(row, 13)?;
    let version: i64 = column(row, 14)?;
    let created_at: String = column(row, 15)?;
    let last_updated: String = column(row, 16)?;

    Ok(Review {
        id: ReviewId::new(id).map_err(ReviewError::storage)?,
        member_firm: column(row, 1)?,
        review_type: decode_enum(&review_type)?,
        review_mode: decode_enum(&review_mode)?,
        country: column(row, 4)?,
        reviewer: column(row, 5)?,
        reviewer_id: column(row, 6)?,
        status: decode_enum(&status)?,
        acceptance: decode_json(&acceptance)?,
        assessment: decode_json(&assessment)?,
        rejection: rejection.as_deref().map(decode_json).transpose()?,
        start_date: from_date(&start_date)?,
        end_date: from_date(&end_date)?,
        due_date: due_date.as_deref().map(from_date).transpose()?,
        documents: Vec::new(),
        history: Vec::new(),
        version: version_from_sql(version)?,
        created_at: from_rfc3339(&created_at)?,
        last_updated: from_rfc3339(&last_updated)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::with_test_db;
    use chrono::{NaiveDate, TimeZone, Utc};
    use qa_core::status::{WorkflowStage, WorkflowStatus};
    use qa_core::types::{
        AssignReviewInput, CreateReviewInput, DocumentCategory, DocumentInput, Grade,
        RatingInput, ReviewMode, ReviewType, SubmitReviewInput,
    };
    use qa_core::workflow;

    fn draft(firm: &str) -> Review {
        workflow::create(
            ReviewId::generate(),
            &CreateReviewInput {
                member_firm: firm.to_string(),
                review_type: ReviewType::Normal,
                review_mode: ReviewMode::Remote,
                country: "Kenya".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
                due_date: Some(NaiveDate::from_ymd_opt(2026, 1, 25).unwrap()),
                initial_status: None,
            },
            Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn assign_input(reviewer: &str) -> AssignReviewInput {
        AssignReviewInput {
            reviewer_id: reviewer.to_string(),
            reviewer_name: None,
            assigned_by: "admin".to_string(),
        }
    }

    #[test]
    fn create_then_get_round_trips_all_fields() {
        let conn = with_test_db().unwrap();
        let repo = ReviewRepo::new(&conn);
        let created = repo.create(&draft("FirmX")).unwrap();
        assert_eq!(created.version, 1);
        let loaded = repo.get(&created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
        assert!(repo.get(&ReviewId::generate()).unwrap().is_none());
    }

    #[test]
    fn save_bumps_version_and_appends_history() {
        let conn = with_test_db().unwrap();
        let repo = ReviewRepo::new(&conn);
        let created = repo.create(&draft("FirmX")).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap();
        let t = workflow::assign(&created, &assign_input("R1"), at).unwrap();
        let saved = repo.save(&t.review, &t.entry, created.version).unwrap();
        assert_eq!(saved.version, 2);

        let loaded = repo.get(&created.id).unwrap().unwrap();
        assert_eq!(loaded.status, WorkflowStatus::PendingAcceptance);
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.history, vec![t.entry.clone()]);
        assert_eq!(repo.history(&created.id).unwrap(), vec![t.entry]);
    }

    #[test]
    fn stale_save_is_a_conflict() {
        let conn = with_test_db().unwrap();
        let repo = ReviewRepo::new(&conn);
        let created = repo.create(&draft("FirmX")).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap();
        let first = workflow::assign(&created, &assign_input("R1"), at).unwrap();
        let second = workflow::assign(&created, &assign_input("R2"), at).unwrap();
        repo.save(&first.review, &first.entry, created.version)
            .unwrap();
        let err = repo
            .save(&second.review, &second.entry, created.version)
            .unwrap_err();
        assert_eq!(
            err,
            ReviewError::Conflict {
                expected: 1,
                actual: 2,
            }
        );
        let loaded = repo.get(&created.id).unwrap().unwrap();
        assert_eq!(loaded.reviewer_id.as_deref(), Some("R1"));
        assert_eq!(loaded.history.len(), 1);
    }

    #[test]
    fn save_of_unknown_review_is_not_found() {
        let conn = with_test_db().unwrap();
        let repo = ReviewRepo::new(&conn);
        let review = draft("FirmX");
        let at = Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap();
        let t = workflow::assign(&review, &assign_input("R1"), at).unwrap();
        assert_eq!(
            repo.save(&t.review, &t.entry, 1).unwrap_err(),
            ReviewError::ReviewNotFound
        );
    }

    #[test]
    fn submitted_documents_are_stored_separately() {
        let conn = with_test_db().unwrap();
        let repo = ReviewRepo::new(&conn);
        let mut review = draft("FirmX");
        review.status = WorkflowStatus::InProgress;
        let review = repo.create(&review).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap();
        let input = SubmitReviewInput {
            rating: RatingInput {
                grade: Some(Grade::Two),
                comments: None,
                strengths: None,
                areas_for_improvement: None,
                recommendations: None,
                submitted_by: "R1".to_string(),
                time_spent_hours: Some(30.0),
            },
            reviewed_documents: vec![
                DocumentInput {
                    category: DocumentCategory::Reviewed,
                    name: "file-a.pdf".to_string(),
                    location: "blob://a".to_string(),
                    uploaded_by: "R1".to_string(),
                },
                DocumentInput {
                    category: DocumentCategory::Supporting,
                    name: "file-b.xlsx".to_string(),
                    location: "blob://b".to_string(),
                    uploaded_by: "R1".to_string(),
                },
            ],
        };
        let t = workflow::submit(&review, &input, at).unwrap();
        repo.save(&t.review, &t.entry, review.version).unwrap();

        let loaded = repo.get(&review.id).unwrap().unwrap();
        assert_eq!(loaded.documents.len(), 2);
        assert_eq!(loaded.documents[1].category, DocumentCategory::Supporting);
        assert_eq!(loaded.reviewer_rating().unwrap().grade, Grade::Two);
        let stored: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM review_documents WHERE review_id = ?1",
                [review.id.as_str()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, 2);
    }

    #[test]
    fn list_applies_sql_and_stage_filters() {
        let conn = with_test_db().unwrap();
        let repo = ReviewRepo::new(&conn);
        let a = repo.create(&draft("FirmX")).unwrap();
        let b = repo.create(&draft("FirmY")).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap();
        let t = workflow::assign(&b, &assign_input("R9"), at).unwrap();
        repo.save(&t.review, &t.entry, b.version).unwrap();

        assert_eq!(repo.list(&ReviewFilter::default()).unwrap().len(), 2);

        let by_firm = repo
            .list(&ReviewFilter {
                member_firm: Some("firmx".to_string()),
                ..ReviewFilter::default()
            })
            .unwrap();
        assert_eq!(by_firm.len(), 1);
        assert_eq!(by_firm[0].id, a.id);

        let by_stage = repo
            .list(&ReviewFilter {
                stage: Some(WorkflowStage::Acceptance),
                ..ReviewFilter::default()
            })
            .unwrap();
        assert_eq!(by_stage.len(), 1);
        assert_eq!(by_stage[0].id, b.id);

        let by_status = repo
            .list(&ReviewFilter {
                status: Some(vec![WorkflowStatus::Draft, WorkflowStatus::Completed]),
                reviewer_id: None,
                ..ReviewFilter::default()
            })
            .unwrap();
        assert_eq!(by_status.len(), 1);

        let by_reviewer = repo
            .list(&ReviewFilter {
                reviewer_id: Some("R9".to_string()),
                ..ReviewFilter::default()
            })
            .unwrap();
        assert_eq!(by_reviewer[0].history.len(), 1);
    }
}
