//! Medicine documents and their name-keyword index.

use rusqlite::{params, Connection};
use serde_json::Value;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::{MedicineFilter, NewMedicine, StoredMedicine};

/// Insert one medicine document plus its keyword rows, atomically.
///
/// The document is the record's JSON with `userId` and `createdAt` added;
/// the generated id is the row key and never part of the document.
pub fn insert_medicine(conn: &mut Connection, medicine: &NewMedicine) -> Result<String, StoreError> {
    let id = Uuid::new_v4().to_string();

    let mut document = serde_json::to_value(&medicine.record)?;
    let Value::Object(fields) = &mut document else {
        return Err(StoreError::CorruptDocument { id });
    };
    fields.remove("id");
    fields.insert("userId".into(), Value::String(medicine.user_id.clone()));
    fields.insert("createdAt".into(), Value::String(medicine.created_at.clone()));

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO medicines (id, user_id, created_at, document) VALUES (?1, ?2, ?3, ?4)",
        params![
            id,
            medicine.user_id,
            medicine.created_at,
            serde_json::to_string(&document)?,
        ],
    )?;
    for keyword in medicine.record.name_keywords() {
        tx.execute(
            "INSERT OR IGNORE INTO medicine_keywords (medicine_id, keyword) VALUES (?1, ?2)",
            params![id, keyword],
        )?;
    }
    tx.commit()?;

    Ok(id)
}

/// A caller's documents matching every supplied predicate, oldest first.
pub fn list_medicines(
    conn: &Connection,
    user_id: &str,
    filter: &MedicineFilter,
) -> Result<Vec<StoredMedicine>, StoreError> {
    let mut sql = String::from("SELECT m.id, m.document FROM medicines m WHERE m.user_id = ?1");

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(user_id.to_string())];
    let mut param_idx = 2;

    if let Some(active) = filter.active {
        // json_type distinguishes boolean true/false from 1/0 and "true"
        sql.push_str(&format!(" AND json_type(m.document, '$.active') = ?{param_idx}"));
        params_vec.push(Box::new(if active { "true" } else { "false" }));
        param_idx += 1;
    }

    if let Some(category) = &filter.category {
        sql.push_str(&format!(
            " AND json_type(m.document, '$.category') = 'text'
              AND json_extract(m.document, '$.category') = ?{param_idx}"
        ));
        params_vec.push(Box::new(category.clone()));
        param_idx += 1;
    }

    if let Some(keyword) = &filter.name_keyword {
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM medicine_keywords k
                          WHERE k.medicine_id = m.id AND k.keyword = ?{param_idx})"
        ));
        params_vec.push(Box::new(keyword.clone()));
    }

    sql.push_str(" ORDER BY m.seq ASC");

    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, document)| stored_from_document(id, &document))
        .collect()
}

fn stored_from_document(id: String, document: &str) -> Result<StoredMedicine, StoreError> {
    let mut value: Value = serde_json::from_str(document)?;
    let Value::Object(fields) = &mut value else {
        return Err(StoreError::CorruptDocument { id });
    };
    fields.insert("id".into(), Value::String(id));
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::MedicineRecord;
    use serde_json::json;

    fn new_medicine(user_id: &str, payload: serde_json::Value) -> NewMedicine {
        NewMedicine {
            user_id: user_id.into(),
            created_at: "2026-10-16T09:00:00.000Z".into(),
            record: serde_json::from_value::<MedicineRecord>(payload).unwrap(),
        }
    }

    fn seed(conn: &mut Connection) {
        for (user, payload) in [
            ("alice", json!({ "medicineName": "Vitamin D3", "active": true, "category": "supplement" })),
            ("alice", json!({ "medicineName": "Amoxicillin", "active": false, "category": "antibiotic" })),
            ("alice", json!({ "medicineName": "Ibuprofen", "active": "true" })),
            ("alice", json!({ "medicineName": "Zinc", "active": 1 })),
            ("bob", json!({ "medicineName": "Vitamin C", "active": true, "category": "supplement" })),
        ] {
            insert_medicine(conn, &new_medicine(user, payload)).unwrap();
        }
    }

    fn names(meds: &[StoredMedicine]) -> Vec<&str> {
        meds.iter()
            .map(|m| m.record.medicine_name.as_deref().unwrap())
            .collect()
    }

    #[test]
    fn insert_and_list_round_trip() {
        let mut conn = open_memory_database().unwrap();
        let id = insert_medicine(
            &mut conn,
            &new_medicine("alice", json!({ "medicineName": "Aspirin", "notes": "with water" })),
        )
        .unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        let meds = list_medicines(&conn, "alice", &MedicineFilter::default()).unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].id, id);
        assert_eq!(meds[0].user_id, "alice");
        assert_eq!(meds[0].created_at, "2026-10-16T09:00:00.000Z");
        assert_eq!(meds[0].record.notes.as_deref(), Some("with water"));
    }

    #[test]
    fn stored_document_has_record_fields_plus_owner_and_timestamp() {
        let mut conn = open_memory_database().unwrap();
        let id = insert_medicine(
            &mut conn,
            &new_medicine("alice", json!({ "medicineName": "Aspirin", "id": "client-id" })),
        )
        .unwrap();

        let document: String = conn
            .query_row("SELECT document FROM medicines WHERE id = ?1", params![id], |row| row.get(0))
            .unwrap();
        let document: Value = serde_json::from_str(&document).unwrap();
        assert_eq!(
            document,
            json!({
                "medicineName": "Aspirin",
                "userId": "alice",
                "createdAt": "2026-10-16T09:00:00.000Z"
            })
        );
    }

    #[test]
    fn list_is_scoped_to_owner_in_insertion_order() {
        let mut conn = open_memory_database().unwrap();
        seed(&mut conn);

        let alice = list_medicines(&conn, "alice", &MedicineFilter::default()).unwrap();
        assert_eq!(names(&alice), ["Vitamin D3", "Amoxicillin", "Ibuprofen", "Zinc"]);

        let carol = list_medicines(&conn, "carol", &MedicineFilter::default()).unwrap();
        assert!(carol.is_empty());
    }

    #[test]
    fn active_filter_matches_boolean_only() {
        let mut conn = open_memory_database().unwrap();
        seed(&mut conn);

        let active = MedicineFilter {
            active: Some(true),
            ..Default::default()
        };
        assert_eq!(names(&list_medicines(&conn, "alice", &active).unwrap()), ["Vitamin D3"]);

        let inactive = MedicineFilter {
            active: Some(false),
            ..Default::default()
        };
        assert_eq!(names(&list_medicines(&conn, "alice", &inactive).unwrap()), ["Amoxicillin"]);
    }

    #[test]
    fn category_and_name_filters_combine() {
        let mut conn = open_memory_database().unwrap();
        seed(&mut conn);

        let supplements = MedicineFilter {
            category: Some("supplement".into()),
            ..Default::default()
        };
        assert_eq!(names(&list_medicines(&conn, "alice", &supplements).unwrap()), ["Vitamin D3"]);

        let vitamin = MedicineFilter {
            name_keyword: Some("vitamin".into()),
            ..Default::default()
        };
        assert_eq!(names(&list_medicines(&conn, "bob", &vitamin).unwrap()), ["Vitamin C"]);

        let full_name = MedicineFilter {
            name_keyword: Some("vitamin d3".into()),
            active: Some(true),
            category: Some("supplement".into()),
        };
        assert_eq!(names(&list_medicines(&conn, "alice", &full_name).unwrap()), ["Vitamin D3"]);

        let partial = MedicineFilter {
            name_keyword: Some("vita".into()),
            ..Default::default()
        };
        assert!(list_medicines(&conn, "alice", &partial).unwrap().is_empty());
    }

    #[test]
    fn keywords_are_written_with_the_document() {
        let mut conn = open_memory_database().unwrap();
        let id = insert_medicine(
            &mut conn,
            &new_medicine("alice", json!({ "medicineName": "Fish Oil" })),
        )
        .unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM medicine_keywords WHERE medicine_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
        let documents: i64 = conn
            .query_row("SELECT COUNT(*) FROM medicines", [], |row| row.get(0))
            .unwrap();
        assert_eq!(documents, 1);
    }
}
