//! Startup seeding: admin account plus the tomato disease reference set.
//! Safe to call on every startup — existence is checked before inserting.

use uuid::Uuid;

use crate::auth::hash_password;
use crate::db::Db;

pub async fn seed_all(pool: &Db) -> anyhow::Result<()> {
    seed_admin(pool).await?;
    seed_regions(pool).await?;
    seed_diseases(pool).await?;
    seed_medicines(pool).await?;

    Ok(())
}

async fn seed_admin(pool: &Db) -> anyhow::Result<()> {
    const ADMIN_EMAIL: &str = "admin@leafguard.app";
    const ADMIN_PASSWORD: &str = "admin";

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND role = 'ADMIN')",
    )
    .bind(ADMIN_EMAIL)
    .fetch_one(pool)
    .await?;

    if !exists {
        let hash = hash_password(ADMIN_PASSWORD)?;
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, is_verified)
             VALUES (?, 'admin', ?, ?, 'ADMIN', 1)",
        )
        .bind(id)
        .bind(ADMIN_EMAIL)
        .bind(hash)
        .execute(pool)
        .await?;
        tracing::info!("Seeded admin account (email: {ADMIN_EMAIL})");
    }

    Ok(())
}

async fn seed_regions(pool: &Db) -> anyhow::Result<()> {
    let regions: [(&str, f64, f64); 3] = [
        ("Northern Plains", 36.75, 3.06),
        ("Central Valley", 35.69, -0.63),
        ("Coastal Belt", 36.90, 7.76),
    ];

    for (name, lat, lng) in regions {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM regions WHERE name = ?)")
                .bind(name)
                .fetch_one(pool)
                .await?;
        if !exists {
            sqlx::query("INSERT INTO regions (id, name, latitude, longitude) VALUES (?, ?, ?, ?)")
                .bind(Uuid::new_v4().to_string())
                .bind(name)
                .bind(lat)
                .bind(lng)
                .execute(pool)
                .await?;
        }
    }

    Ok(())
}

struct DiseaseSeed {
    name:            &'static str,
    scientific_name: &'static str,
    description:     &'static str,
    symptoms:        &'static str,
    severity:        &'static str,
    prevention:      &'static str,
    treatment:       &'static str,
}

/// The tomato classes recognized by the classification model, including the
/// healthy class used by the dashboard healthy-vs-diseased split.
const DISEASES: &[DiseaseSeed] = &[
    DiseaseSeed {
        name:            "Tomato___Bacterial_spot",
        scientific_name: "Xanthomonas campestris pv. vesicatoria",
        description:     "Bacterial disease causing small, dark, water-soaked lesions on leaves and fruits.",
        symptoms:        "Leaf spots, fruit scabbing, yellow halos.",
        severity:        "Moderate to severe",
        prevention:      "Use certified seeds, avoid splashing water on leaves.",
        treatment:       "Apply copper-based sprays and remove infected parts.",
    },
    DiseaseSeed {
        name:            "Tomato___Early_blight",
        scientific_name: "Alternaria solani",
        description:     "Fungal disease appearing as concentric ring spots on older leaves.",
        symptoms:        "Brown leaf spots with yellowing, leaf drop.",
        severity:        "Moderate",
        prevention:      "Use resistant varieties, crop rotation.",
        treatment:       "Use fungicides like mancozeb or chlorothalonil.",
    },
    DiseaseSeed {
        name:            "Tomato___Late_blight",
        scientific_name: "Phytophthora infestans",
        description:     "Aggressive fungal disease in wet, cool weather.",
        symptoms:        "Dark patches, white fuzzy growth under leaves.",
        severity:        "Severe",
        prevention:      "Ensure good drainage, space plants well.",
        treatment:       "Apply fungicides like metalaxyl.",
    },
    DiseaseSeed {
        name:            "Tomato___Leaf_Mold",
        scientific_name: "Passalora fulva",
        description:     "Fungal infection thriving in high humidity and poor airflow.",
        symptoms:        "Yellow leaf spots, olive mold on underside.",
        severity:        "Mild to moderate",
        prevention:      "Improve ventilation and spacing.",
        treatment:       "Apply fungicides like copper or sulfur.",
    },
    DiseaseSeed {
        name:            "Tomato___Septoria_leaf_spot",
        scientific_name: "Septoria lycopersici",
        description:     "Fungus that creates many tiny spots on leaves.",
        symptoms:        "Small gray spots with dark borders on lower leaves.",
        severity:        "Moderate",
        prevention:      "Avoid overhead watering and remove infected debris.",
        treatment:       "Apply chlorothalonil or mancozeb.",
    },
    DiseaseSeed {
        name:            "Tomato___Spider_mites Two-spotted_spider_mite",
        scientific_name: "Tetranychus urticae",
        description:     "Tiny pests feeding on plant sap, causing stippling and yellowing.",
        symptoms:        "Fine webbing, speckled leaves, yellowing.",
        severity:        "Mild to moderate",
        prevention:      "Keep humidity up and introduce natural predators.",
        treatment:       "Use neem oil or insecticidal soap.",
    },
    DiseaseSeed {
        name:            "Tomato___Target_Spot",
        scientific_name: "Corynespora cassiicola",
        description:     "Fungal leaf spot disease causing concentric ring patterns.",
        symptoms:        "Large brown spots with target-like rings.",
        severity:        "Moderate",
        prevention:      "Use well-spaced planting and prune infected leaves.",
        treatment:       "Apply azoxystrobin or chlorothalonil.",
    },
    DiseaseSeed {
        name:            "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
        scientific_name: "Tomato yellow leaf curl virus (TYLCV)",
        description:     "Viral disease transmitted by whiteflies causing curled, yellow leaves.",
        symptoms:        "Upward leaf curling, stunted growth, yellowing.",
        severity:        "Severe",
        prevention:      "Control whiteflies, use resistant varieties.",
        treatment:       "Remove infected plants, manage vector populations.",
    },
    DiseaseSeed {
        name:            "Tomato___Tomato_mosaic_virus",
        scientific_name: "Tomato mosaic virus (ToMV)",
        description:     "Viral disease spread by contact and contaminated tools.",
        symptoms:        "Mottled light and dark green leaf patterns, distortion.",
        severity:        "Moderate to severe",
        prevention:      "Disinfect tools, avoid tobacco handling near plants.",
        treatment:       "Remove infected plants; no chemical cure.",
    },
    DiseaseSeed {
        name:            "Tomato___healthy",
        scientific_name: "",
        description:     "No disease detected.",
        symptoms:        "None.",
        severity:        "None",
        prevention:      "Maintain good growing practices.",
        treatment:       "No treatment needed.",
    },
];

async fn seed_diseases(pool: &Db) -> anyhow::Result<()> {
    let mut inserted = 0u32;
    for d in DISEASES {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM diseases WHERE name = ?)")
                .bind(d.name)
                .fetch_one(pool)
                .await?;
        if exists {
            continue;
        }
        sqlx::query(
            "INSERT INTO diseases (id, name, scientific_name, description, symptoms, severity, prevention, treatment)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(d.name)
        .bind(d.scientific_name)
        .bind(d.description)
        .bind(d.symptoms)
        .bind(d.severity)
        .bind(d.prevention)
        .bind(d.treatment)
        .execute(pool)
        .await?;
        inserted += 1;
    }
    if inserted > 0 {
        tracing::info!(inserted, "Seeded disease reference set");
    }

    Ok(())
}

struct MedicineSeed {
    name:         &'static str,
    description:  &'static str,
    instructions: &'static [&'static str],
    /// Disease names this medicine treats (resolved to ids at seed time).
    diseases:     &'static [&'static str],
}

const MEDICINES: &[MedicineSeed] = &[
    MedicineSeed {
        name:         "Copper Oxychloride 50% WP",
        description:  "Broad-spectrum copper fungicide and bactericide.",
        instructions: &[
            "Mix 3 g per litre of water.",
            "Spray at 7-10 day intervals.",
            "Do not apply within 7 days of harvest.",
        ],
        diseases: &["Tomato___Bacterial_spot", "Tomato___Leaf_Mold"],
    },
    MedicineSeed {
        name:         "Mancozeb 75% WP",
        description:  "Protective dithiocarbamate fungicide for foliar diseases.",
        instructions: &[
            "Mix 2.5 g per litre of water.",
            "Apply before disease onset for best protection.",
            "Repeat every 10 days in wet weather.",
        ],
        diseases: &["Tomato___Early_blight", "Tomato___Septoria_leaf_spot"],
    },
    MedicineSeed {
        name:         "Metalaxyl 8% + Mancozeb 64% WP",
        description:  "Systemic and contact fungicide combination for blight control.",
        instructions: &[
            "Mix 2 g per litre of water.",
            "Apply at first sign of infection.",
            "Maximum 3 applications per season.",
        ],
        diseases: &["Tomato___Late_blight"],
    },
    MedicineSeed {
        name:         "Neem Oil 1500 ppm",
        description:  "Botanical insecticide and miticide.",
        instructions: &[
            "Mix 5 ml per litre of water.",
            "Spray undersides of leaves thoroughly.",
            "Apply in the evening to avoid leaf burn.",
        ],
        diseases: &["Tomato___Spider_mites Two-spotted_spider_mite"],
    },
];

async fn seed_medicines(pool: &Db) -> anyhow::Result<()> {
    let mut inserted = 0u32;
    for m in MEDICINES {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM medicines WHERE name = ?)")
                .bind(m.name)
                .fetch_one(pool)
                .await?;
        if exists {
            continue;
        }

        let id = Uuid::new_v4().to_string();
        let instructions = serde_json::to_string(&m.instructions)?;
        sqlx::query(
            "INSERT INTO medicines (id, name, description, usage_instructions) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(m.name)
        .bind(m.description)
        .bind(instructions)
        .execute(pool)
        .await?;

        for disease_name in m.diseases {
            let disease_id: Option<String> =
                sqlx::query_scalar("SELECT id FROM diseases WHERE name = ?")
                    .bind(disease_name)
                    .fetch_optional(pool)
                    .await?;
            if let Some(disease_id) = disease_id {
                sqlx::query(
                    "INSERT IGNORE INTO disease_medicines (disease_id, medicine_id) VALUES (?, ?)",
                )
                .bind(disease_id)
                .bind(&id)
                .execute(pool)
                .await?;
            }
        }
        inserted += 1;
    }
    if inserted > 0 {
        tracing::info!(inserted, "Seeded medicine reference set");
    }

    Ok(())
}
