pub const BASE_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS children (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER NOT NULL CHECK (age >= 0),
    gender TEXT NOT NULL CHECK (gender IN ('male', 'female', 'other')),
    district TEXT NOT NULL,
    location TEXT NOT NULL,
    education_status TEXT NOT NULL DEFAULT 'none'
        CHECK (education_status IN ('none', 'primary', 'secondary', 'higher_secondary', 'vocational')),
    health_status TEXT NOT NULL DEFAULT 'good'
        CHECK (health_status IN ('excellent', 'good', 'fair', 'poor', 'critical')),
    guardian_name TEXT,
    guardian_phone TEXT,
    special_needs TEXT,
    verified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_children_verified
    ON children(verified);

CREATE TABLE IF NOT EXISTS success_stories (
    id TEXT PRIMARY KEY,
    child_id TEXT NOT NULL REFERENCES children(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    image_url TEXT,
    verified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_stories_verified_created
    ON success_stories(verified, created_at DESC);

CREATE TABLE IF NOT EXISTS donations (
    id TEXT PRIMARY KEY,
    donor_id TEXT NOT NULL,
    amount REAL NOT NULL CHECK (amount > 0),
    currency TEXT NOT NULL DEFAULT 'INR',
    purpose TEXT NOT NULL,
    beneficiary_children_count INTEGER,
    status TEXT NOT NULL DEFAULT 'pending',
    transaction_id TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_donations_donor_created
    ON donations(donor_id, created_at DESC);
"#;
