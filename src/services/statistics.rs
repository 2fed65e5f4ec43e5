//! Role-scoped dashboard aggregators.
//!
//! Each dashboard merges two halves: global reference counts (diseases,
//! medicines) and a role-specific bundle. The halves have no ordering
//! dependency and run as a bounded parallel pair; within each half the reads
//! are grouped in one transaction so the bundle sees a consistent snapshot.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::Db;
use crate::errors::AppResult;

/// Name of the reference row the classifier emits for a healthy leaf; every
/// other disease counts as diseased in the farmer health split.
pub const HEALTHY_DISEASE_NAME: &str = "Tomato___healthy";

const TRAILING_WINDOW_DAYS: i64 = 30;

/// Integer percentage with a total-zero guard: round(part/total × 100),
/// 0 when the denominator is 0.
pub fn percentage(part: i64, total: i64) -> i64 {
    if total == 0 {
        0
    } else {
        ((part as f64 / total as f64) * 100.0).round() as i64
    }
}

/// A top-N list plus its length, the shape every dashboard list uses.
#[derive(Debug, Serialize)]
pub struct ListBundle<T> {
    pub count: usize,
    pub items: Vec<T>,
}

impl<T> ListBundle<T> {
    fn new(items: Vec<T>) -> Self {
        Self { count: items.len(), items }
    }
}

// ── Shared half: global reference counts ─────────────────────

struct PublicCounts {
    total_diseases:  i64,
    total_medicines: i64,
}

async fn public_counts(pool: &Db) -> AppResult<PublicCounts> {
    let mut tx = pool.begin().await?;
    let total_diseases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM diseases")
        .fetch_one(&mut *tx)
        .await?;
    let total_medicines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines")
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(PublicCounts { total_diseases, total_medicines })
}

// ── Farmer dashboard ─────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FarmerDashboard {
    pub total_diseases:       i64,
    pub total_medicines:      i64,
    pub total_detections:     i64,
    pub disease_distribution: ListBundle<DiseaseShare>,
    pub health_status:        HealthStatus,
    pub recent_detections:    ListBundle<RecentDetection>,
    pub advice_stats:         AdviceStats,
    pub feedback_status:      FeedbackStatusCounts,
    pub unread_notifications: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DiseaseShare {
    pub disease: String,
    pub count:   i64,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub healthy:  i64,
    pub diseased: i64,
    pub total:    i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RecentDetection {
    pub id:          String,
    pub disease:     String,
    pub image:       Option<String>,
    pub confidence:  f64,
    pub detected_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct AdviceStats {
    pub total:                    i64,
    pub with_medicine:            i64,
    pub percentage_with_medicine: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct FeedbackStatusCounts {
    pub pending:   i64,
    pub addressed: i64,
    pub resolved:  i64,
    pub rejected:  i64,
    pub total:     i64,
}

impl FeedbackStatusCounts {
    fn from_rows(rows: Vec<(String, i64)>) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            match status.as_str() {
                "pending"   => counts.pending = count,
                "addressed" => counts.addressed = count,
                "resolved"  => counts.resolved = count,
                "rejected"  => counts.rejected = count,
                _ => {}
            }
            counts.total += count;
        }
        counts
    }
}

pub async fn farmer_dashboard(
    pool: &Db,
    farmer_id: &str,
    user_id: &str,
) -> AppResult<FarmerDashboard> {
    let (public, bundle) = tokio::try_join!(
        public_counts(pool),
        farmer_bundle(pool, farmer_id, user_id),
    )?;

    Ok(FarmerDashboard {
        total_diseases:       public.total_diseases,
        total_medicines:      public.total_medicines,
        total_detections:     bundle.total_detections,
        disease_distribution: bundle.disease_distribution,
        health_status:        bundle.health_status,
        recent_detections:    bundle.recent_detections,
        advice_stats:         bundle.advice_stats,
        feedback_status:      bundle.feedback_status,
        unread_notifications: bundle.unread_notifications,
    })
}

struct FarmerBundle {
    total_detections:     i64,
    disease_distribution: ListBundle<DiseaseShare>,
    health_status:        HealthStatus,
    recent_detections:    ListBundle<RecentDetection>,
    advice_stats:         AdviceStats,
    feedback_status:      FeedbackStatusCounts,
    unread_notifications: i64,
}

async fn farmer_bundle(pool: &Db, farmer_id: &str, user_id: &str) -> AppResult<FarmerBundle> {
    let mut tx = pool.begin().await?;

    // Top-5 diseases by this farmer's detection count. Tie-break is
    // implementation-defined but stable within one query (secondary name sort).
    let disease_distribution: Vec<DiseaseShare> = sqlx::query_as(
        "SELECT d.name AS disease, COUNT(*) AS count
         FROM detections det
         JOIN diseases d ON d.id = det.disease_id
         WHERE det.farmer_id = ?
         GROUP BY d.id, d.name
         ORDER BY count DESC, d.name
         LIMIT 5",
    )
    .bind(farmer_id)
    .fetch_all(&mut *tx)
    .await?;

    let total_detections: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM detections WHERE farmer_id = ?")
            .bind(farmer_id)
            .fetch_one(&mut *tx)
            .await?;

    let healthy: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)
         FROM detections det
         JOIN diseases d ON d.id = det.disease_id
         WHERE det.farmer_id = ? AND d.name = ?",
    )
    .bind(farmer_id)
    .bind(HEALTHY_DISEASE_NAME)
    .fetch_one(&mut *tx)
    .await?;

    let recent_detections: Vec<RecentDetection> = sqlx::query_as(
        "SELECT det.id, d.name AS disease, det.image, det.confidence, det.detected_at
         FROM detections det
         JOIN diseases d ON d.id = det.disease_id
         WHERE det.farmer_id = ?
         ORDER BY det.detected_at DESC
         LIMIT 5",
    )
    .bind(farmer_id)
    .fetch_all(&mut *tx)
    .await?;

    let total_advice: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)
         FROM advices a
         JOIN detections det ON det.id = a.detection_id
         WHERE det.farmer_id = ?",
    )
    .bind(farmer_id)
    .fetch_one(&mut *tx)
    .await?;

    let advice_with_medicine: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)
         FROM advices a
         JOIN detections det ON det.id = a.detection_id
         WHERE det.farmer_id = ? AND a.medicine_id IS NOT NULL",
    )
    .bind(farmer_id)
    .fetch_one(&mut *tx)
    .await?;

    let feedback_rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM feedbacks WHERE farmer_id = ? GROUP BY status",
    )
    .bind(farmer_id)
    .fetch_all(&mut *tx)
    .await?;

    let unread_notifications: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(FarmerBundle {
        total_detections,
        disease_distribution: ListBundle::new(disease_distribution),
        health_status: HealthStatus {
            healthy,
            diseased: total_detections - healthy,
            total: total_detections,
        },
        recent_detections: ListBundle::new(recent_detections),
        advice_stats: AdviceStats {
            total:                    total_advice,
            with_medicine:            advice_with_medicine,
            percentage_with_medicine: percentage(advice_with_medicine, total_advice),
        },
        feedback_status: FeedbackStatusCounts::from_rows(feedback_rows),
        unread_notifications,
    })
}

// ── Agronomist dashboard ─────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AgronomistDashboard {
    pub total_diseases:     i64,
    pub total_medicines:    i64,
    pub farmer_stats:       FarmerStats,
    pub disease_trends:     ListBundle<DiseaseTrend>,
    pub advice_performance: AdvicePerformance,
    pub recent_detections:  ListBundle<SystemDetection>,
    pub pending_actions:    PendingActions,
    pub top_medicines:      ListBundle<TopMedicine>,
}

#[derive(Debug, Serialize)]
pub struct FarmerStats {
    pub total_farmers:  i64,
    pub active_farmers: ActiveFarmers,
}

#[derive(Debug, Serialize)]
pub struct ActiveFarmers {
    pub count:      i64,
    pub percentage: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DiseaseTrend {
    pub name:            String,
    pub detection_count: i64,
    pub last_detection:  Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct AdvicePerformance {
    pub total:               i64,
    pub with_feedback:       i64,
    pub feedback_percentage: i64,
}

#[derive(Debug, Serialize)]
pub struct SystemDetection {
    pub id:          String,
    pub disease:     String,
    pub farmer:      Option<String>,
    pub detected_at: NaiveDateTime,
    pub location:    Option<GeoPoint>,
}

#[derive(Debug, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct PendingActions {
    pub unread_notifications: i64,
    pub pending_feedback:     i64,
}

#[derive(Debug, Serialize)]
pub struct TopMedicine {
    pub name:        String,
    pub usage_count: i64,
    pub diseases:    ListBundle<String>,
}

pub async fn agronomist_dashboard(
    pool: &Db,
    agronomist_id: &str,
    user_id: &str,
) -> AppResult<AgronomistDashboard> {
    let (public, bundle) = tokio::try_join!(
        public_counts(pool),
        agronomist_bundle(pool, agronomist_id, user_id),
    )?;

    Ok(AgronomistDashboard {
        total_diseases:     public.total_diseases,
        total_medicines:    public.total_medicines,
        farmer_stats:       bundle.farmer_stats,
        disease_trends:     bundle.disease_trends,
        advice_performance: bundle.advice_performance,
        recent_detections:  bundle.recent_detections,
        pending_actions:    bundle.pending_actions,
        top_medicines:      bundle.top_medicines,
    })
}

struct AgronomistBundle {
    farmer_stats:       FarmerStats,
    disease_trends:     ListBundle<DiseaseTrend>,
    advice_performance: AdvicePerformance,
    recent_detections:  ListBundle<SystemDetection>,
    pending_actions:    PendingActions,
    top_medicines:      ListBundle<TopMedicine>,
}

async fn agronomist_bundle(
    pool: &Db,
    agronomist_id: &str,
    user_id: &str,
) -> AppResult<AgronomistBundle> {
    let mut tx = pool.begin().await?;

    let total_farmers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM farmers")
        .fetch_one(&mut *tx)
        .await?;

    let active_farmers: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT farmer_id)
         FROM detections
         WHERE detected_at >= UTC_TIMESTAMP() - INTERVAL ? DAY",
    )
    .bind(TRAILING_WINDOW_DAYS)
    .fetch_one(&mut *tx)
    .await?;

    let disease_trends: Vec<DiseaseTrend> = sqlx::query_as(
        "SELECT d.name, COUNT(det.id) AS detection_count, MAX(det.detected_at) AS last_detection
         FROM diseases d
         LEFT JOIN detections det ON det.disease_id = d.id
         GROUP BY d.id, d.name
         ORDER BY detection_count DESC, d.name
         LIMIT 5",
    )
    .fetch_all(&mut *tx)
    .await?;

    let total_advice: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM advices WHERE agronomist_id = ?")
            .bind(agronomist_id)
            .fetch_one(&mut *tx)
            .await?;

    let advice_with_feedback: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT a.id)
         FROM advices a
         JOIN feedbacks f ON f.advice_id = a.id
         WHERE a.agronomist_id = ?",
    )
    .bind(agronomist_id)
    .fetch_one(&mut *tx)
    .await?;

    #[derive(sqlx::FromRow)]
    struct SystemDetectionRow {
        id:          String,
        disease:     String,
        farmer:      Option<String>,
        detected_at: NaiveDateTime,
        latitude:    Option<f64>,
        longitude:   Option<f64>,
    }

    let recent_rows: Vec<SystemDetectionRow> = sqlx::query_as(
        "SELECT det.id, d.name AS disease, u.username AS farmer, det.detected_at,
                det.latitude, det.longitude
         FROM detections det
         JOIN diseases d ON d.id = det.disease_id
         JOIN farmers f  ON f.id = det.farmer_id
         JOIN users u    ON u.id = f.user_id
         ORDER BY det.detected_at DESC
         LIMIT 5",
    )
    .fetch_all(&mut *tx)
    .await?;

    let recent_detections: Vec<SystemDetection> = recent_rows
        .into_iter()
        .map(|row| SystemDetection {
            id:          row.id,
            disease:     row.disease,
            farmer:      row.farmer,
            detected_at: row.detected_at,
            // location only when both coordinates are present
            location: match (row.latitude, row.longitude) {
                (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
                _ => None,
            },
        })
        .collect();

    let unread_notifications: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let pending_feedback: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM feedbacks WHERE status = 'pending'")
            .fetch_one(&mut *tx)
            .await?;

    let medicine_rows: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT m.id, m.name, COUNT(a.id) AS usage_count
         FROM medicines m
         LEFT JOIN advices a ON a.medicine_id = m.id
         GROUP BY m.id, m.name
         ORDER BY usage_count DESC, m.name
         LIMIT 3",
    )
    .fetch_all(&mut *tx)
    .await?;

    let mut top_medicines = Vec::with_capacity(medicine_rows.len());
    for (medicine_id, name, usage_count) in medicine_rows {
        let disease_names: Vec<String> = sqlx::query_scalar(
            "SELECT d.name
             FROM disease_medicines dm
             JOIN diseases d ON d.id = dm.disease_id
             WHERE dm.medicine_id = ?
             ORDER BY d.name",
        )
        .bind(&medicine_id)
        .fetch_all(&mut *tx)
        .await?;
        top_medicines.push(TopMedicine {
            name,
            usage_count,
            diseases: ListBundle::new(disease_names),
        });
    }

    tx.commit().await?;

    Ok(AgronomistBundle {
        farmer_stats: FarmerStats {
            total_farmers,
            active_farmers: ActiveFarmers {
                count:      active_farmers,
                percentage: percentage(active_farmers, total_farmers),
            },
        },
        disease_trends: ListBundle::new(disease_trends),
        advice_performance: AdvicePerformance {
            total:               total_advice,
            with_feedback:       advice_with_feedback,
            feedback_percentage: percentage(advice_with_feedback, total_advice),
        },
        recent_detections: ListBundle::new(recent_detections),
        pending_actions: PendingActions {
            unread_notifications,
            pending_feedback,
        },
        top_medicines: ListBundle::new(top_medicines),
    })
}

// ── Admin dashboard ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub total_diseases:  i64,
    pub total_medicines: i64,
    pub user_stats:      UserStats,
    pub detection_stats: DetectionStats,
    pub disease_stats:   ListBundle<TopDisease>,
    pub feedback_stats:  FeedbackStats,
    pub recent_activity: RecentActivity,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_users:       i64,
    pub active_users:      i64,
    pub active_percentage: i64,
    pub role_distribution: ListBundle<RoleShare>,
}

#[derive(Debug, Serialize)]
pub struct RoleShare {
    pub role:       String,
    pub count:      i64,
    pub percentage: i64,
}

#[derive(Debug, Serialize)]
pub struct DetectionStats {
    pub total_detections:  i64,
    pub recent_detections: i64,
    pub recent_percentage: i64,
}

#[derive(Debug, Serialize)]
pub struct TopDisease {
    pub name:            String,
    pub detection_count: i64,
    pub percentage:      i64,
}

#[derive(Debug, Serialize)]
pub struct FeedbackStats {
    pub total_feedbacks:      i64,
    pub unresolved_feedbacks: i64,
    pub resolved_percentage:  i64,
}

#[derive(Debug, Serialize)]
pub struct RecentActivity {
    pub new_users:       ListBundle<NewUser>,
    pub critical_issues: ListBundle<CriticalIssue>,
}

/// Selected field subset only — the credential hash is never projected.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct NewUser {
    pub id:              String,
    pub username:        Option<String>,
    pub email:           String,
    pub role:            String,
    pub profile_picture: Option<String>,
    pub created_at:      NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct CriticalIssue {
    pub id:         String,
    pub category:   String,
    pub farmer:     Option<String>,
    pub disease:    String,
    pub created_at: NaiveDateTime,
}

pub async fn admin_dashboard(pool: &Db) -> AppResult<AdminDashboard> {
    let (public, bundle) = tokio::try_join!(public_counts(pool), admin_bundle(pool))?;

    Ok(AdminDashboard {
        total_diseases:  public.total_diseases,
        total_medicines: public.total_medicines,
        user_stats:      bundle.user_stats,
        detection_stats: bundle.detection_stats,
        disease_stats:   bundle.disease_stats,
        feedback_stats:  bundle.feedback_stats,
        recent_activity: bundle.recent_activity,
    })
}

struct AdminBundle {
    user_stats:      UserStats,
    detection_stats: DetectionStats,
    disease_stats:   ListBundle<TopDisease>,
    feedback_stats:  FeedbackStats,
    recent_activity: RecentActivity,
}

async fn admin_bundle(pool: &Db) -> AppResult<AdminBundle> {
    let mut tx = pool.begin().await?;

    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await?;

    let active_users: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE last_login >= UTC_TIMESTAMP() - INTERVAL ? DAY",
    )
    .bind(TRAILING_WINDOW_DAYS)
    .fetch_one(&mut *tx)
    .await?;

    let role_rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role ORDER BY COUNT(*) DESC")
            .fetch_all(&mut *tx)
            .await?;

    let total_detections: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM detections")
        .fetch_one(&mut *tx)
        .await?;

    let recent_detections: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM detections WHERE detected_at >= UTC_TIMESTAMP() - INTERVAL ? DAY",
    )
    .bind(TRAILING_WINDOW_DAYS)
    .fetch_one(&mut *tx)
    .await?;

    let top_disease_rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT d.name, COUNT(det.id) AS detection_count
         FROM diseases d
         LEFT JOIN detections det ON det.disease_id = d.id
         GROUP BY d.id, d.name
         ORDER BY detection_count DESC, d.name
         LIMIT 5",
    )
    .fetch_all(&mut *tx)
    .await?;

    let total_feedbacks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedbacks")
        .fetch_one(&mut *tx)
        .await?;

    let unresolved_feedbacks: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM feedbacks WHERE status = 'pending'")
            .fetch_one(&mut *tx)
            .await?;

    let new_users: Vec<NewUser> = sqlx::query_as(
        "SELECT id, username, email, role, profile_picture, created_at
         FROM users
         ORDER BY created_at DESC
         LIMIT 5",
    )
    .fetch_all(&mut *tx)
    .await?;

    #[derive(sqlx::FromRow)]
    struct IssueRow {
        id:         String,
        category:   String,
        farmer:     Option<String>,
        disease:    Option<String>,
        created_at: NaiveDateTime,
    }

    let issue_rows: Vec<IssueRow> = sqlx::query_as(
        "SELECT fb.id, fb.category, u.username AS farmer, d.name AS disease, fb.created_at
         FROM feedbacks fb
         JOIN farmers f ON f.id = fb.farmer_id
         JOIN users u   ON u.id = f.user_id
         LEFT JOIN detections det ON det.id = fb.detection_id
         LEFT JOIN diseases d     ON d.id = det.disease_id
         WHERE fb.status = 'pending'
         ORDER BY fb.created_at DESC
         LIMIT 3",
    )
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let role_distribution: Vec<RoleShare> = role_rows
        .into_iter()
        .map(|(role, count)| RoleShare {
            role,
            count,
            percentage: percentage(count, total_users),
        })
        .collect();

    let disease_stats: Vec<TopDisease> = top_disease_rows
        .into_iter()
        .map(|(name, detection_count)| TopDisease {
            name,
            detection_count,
            percentage: percentage(detection_count, total_detections),
        })
        .collect();

    let critical_issues: Vec<CriticalIssue> = issue_rows
        .into_iter()
        .map(|row| CriticalIssue {
            id:         row.id,
            category:   row.category,
            farmer:     row.farmer,
            disease:    row.disease.unwrap_or_else(|| "Unknown".to_owned()),
            created_at: row.created_at,
        })
        .collect();

    Ok(AdminBundle {
        user_stats: UserStats {
            total_users,
            active_users,
            active_percentage: percentage(active_users, total_users),
            role_distribution: ListBundle::new(role_distribution),
        },
        detection_stats: DetectionStats {
            total_detections,
            recent_detections,
            recent_percentage: percentage(recent_detections, total_detections),
        },
        disease_stats:  ListBundle::new(disease_stats),
        feedback_stats: FeedbackStats {
            total_feedbacks,
            unresolved_feedbacks,
            resolved_percentage: percentage(total_feedbacks - unresolved_feedbacks, total_feedbacks),
        },
        recent_activity: RecentActivity {
            new_users:       ListBundle::new(new_users),
            critical_issues: ListBundle::new(critical_issues),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_integer() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(7, 0), 0);
    }

    #[test]
    fn percentage_stays_within_bounds() {
        for part in 0..=20 {
            for total in 0..=20 {
                if part <= total {
                    let p = percentage(part, total);
                    assert!((0..=100).contains(&p), "part={part} total={total} p={p}");
                }
            }
        }
    }

    #[test]
    fn feedback_status_counts_sum_to_total() {
        let counts = FeedbackStatusCounts::from_rows(vec![
            ("pending".into(), 3),
            ("resolved".into(), 2),
            ("addressed".into(), 1),
        ]);
        assert_eq!(counts.pending, 3);
        assert_eq!(counts.resolved, 2);
        assert_eq!(counts.addressed, 1);
        assert_eq!(counts.rejected, 0);
        assert_eq!(counts.total, 6);
    }

    #[test]
    fn list_bundle_reports_its_length() {
        let bundle = ListBundle::new(vec!["a", "b"]);
        assert_eq!(bundle.count, 2);
    }
}
