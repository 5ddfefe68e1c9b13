// Valoraciones (1..5) de materiales y apuntes, y notas (0..100) de materiales.
// Cada usuario tiene como mucho una valoración / nota por elemento.

use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Grade, GradeSummary, Rating, RatingSummary};

/// Elemento valorado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTarget {
    Material(i64),
    Note(i64),
}

impl RatingTarget {
    fn table(&self) -> &'static str {
        match self {
            RatingTarget::Material(_) => "material_ratings",
            RatingTarget::Note(_) => "lecture_note_ratings",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            RatingTarget::Material(_) => "material_id",
            RatingTarget::Note(_) => "note_id",
        }
    }

    fn id(&self) -> i64 {
        match self {
            RatingTarget::Material(id) | RatingTarget::Note(id) => *id,
        }
    }

    /// ¿Existe el material o apunte valorado?
    pub fn exists(&self, conn: &Connection) -> rusqlite::Result<bool> {
        let table = match self {
            RatingTarget::Material(_) => "materials",
            RatingTarget::Note(_) => "lecture_notes",
        };
        let found: Option<i64> = conn
            .query_row(&format!("SELECT id FROM {table} WHERE id = ?1"), [self.id()], |r| r.get(0))
            .optional()?;
        Ok(found.is_some())
    }
}

/// Resultado de guardar una valoración o nota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Added,
    Updated,
}

fn average_and_count(conn: &Connection, sql: &str, id: i64) -> rusqlite::Result<(f64, i64)> {
    conn.query_row(sql, [id], |r| {
        let average: Option<f64> = r.get(0)?;
        Ok((average.unwrap_or(0.0), r.get(1)?))
    })
}

pub fn ratings(conn: &Connection, target: RatingTarget) -> rusqlite::Result<RatingSummary> {
    let (table, column) = (target.table(), target.column());
    let mut stmt = conn.prepare(&format!(
        "SELECT r.id, r.rating, r.comment, r.created_at, u.id, u.name, u.role
         FROM {table} r
         JOIN users u ON r.user_id = u.id
         WHERE r.{column} = ?1
         ORDER BY r.created_at DESC, r.id DESC"
    ))?;
    let rows = stmt.query_map([target.id()], |r| {
        let (material_id, note_id) = match target {
            RatingTarget::Material(id) => (Some(id), None),
            RatingTarget::Note(id) => (None, Some(id)),
        };
        Ok(Rating {
            id: r.get(0)?,
            material_id,
            note_id,
            rating: r.get(1)?,
            comment: r.get(2)?,
            created_at: r.get(3)?,
            user_id: r.get(4)?,
            user_name: r.get(5)?,
            user_role: r.get(6)?,
        })
    })?;
    let ratings = rows.collect::<rusqlite::Result<Vec<_>>>()?;

    let (average, count) = average_and_count(
        conn,
        &format!("SELECT AVG(rating), COUNT(*) FROM {table} WHERE {column} = ?1"),
        target.id(),
    )?;
    Ok(RatingSummary { ratings, average, count })
}

pub fn upsert_rating(
    conn: &Connection,
    target: RatingTarget,
    user_id: i64,
    rating: i64,
    comment: &str,
) -> rusqlite::Result<Upsert> {
    let (table, column) = (target.table(), target.column());
    let updated = conn.execute(
        &format!(
            "UPDATE {table} SET rating = ?1, comment = ?2, created_at = datetime('now')
             WHERE {column} = ?3 AND user_id = ?4"
        ),
        params![rating, comment, target.id(), user_id],
    )?;
    if updated > 0 {
        return Ok(Upsert::Updated);
    }
    conn.execute(
        &format!(
            "INSERT INTO {table} ({column}, user_id, rating, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, datetime('now'))"
        ),
        params![target.id(), user_id, rating, comment],
    )?;
    Ok(Upsert::Added)
}

pub fn delete_rating(conn: &Connection, target: RatingTarget, user_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        &format!("DELETE FROM {} WHERE {} = ?1 AND user_id = ?2", target.table(), target.column()),
        params![target.id(), user_id],
    )
}

pub fn grades(conn: &Connection, material_id: i64) -> rusqlite::Result<GradeSummary> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.material_id, g.grade, g.created_at, u.id, u.name, u.role
         FROM material_grades g
         JOIN users u ON g.user_id = u.id
         WHERE g.material_id = ?1
         ORDER BY g.created_at DESC, g.id DESC",
    )?;
    let rows = stmt.query_map([material_id], |r| {
        Ok(Grade {
            id: r.get(0)?,
            material_id: r.get(1)?,
            grade: r.get(2)?,
            created_at: r.get(3)?,
            user_id: r.get(4)?,
            user_name: r.get(5)?,
            user_role: r.get(6)?,
        })
    })?;
    let grades = rows.collect::<rusqlite::Result<Vec<_>>>()?;

    let (average, count) = average_and_count(
        conn,
        "SELECT AVG(grade), COUNT(*) FROM material_grades WHERE material_id = ?1",
        material_id,
    )?;
    Ok(GradeSummary { grades, average, count })
}

pub fn upsert_grade(conn: &Connection, material_id: i64, user_id: i64, grade: i64) -> rusqlite::Result<Upsert> {
    let updated = conn.execute(
        "UPDATE material_grades SET grade = ?1, created_at = datetime('now')
         WHERE material_id = ?2 AND user_id = ?3",
        params![grade, material_id, user_id],
    )?;
    if updated > 0 {
        return Ok(Upsert::Updated);
    }
    conn.execute(
        "INSERT INTO material_grades (material_id, user_id, grade, created_at)
         VALUES (?1, ?2, ?3, datetime('now'))",
        params![material_id, user_id, grade],
    )?;
    Ok(Upsert::Added)
}

pub fn delete_grade(conn: &Connection, material_id: i64, user_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM material_grades WHERE material_id = ?1 AND user_id = ?2",
        params![material_id, user_id],
    )
}
