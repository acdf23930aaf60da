#[derive(serde::Serialize, serde::Deserialize)]
pub struct IdQuery {
    id: Option<String>,
}

impl IdQuery {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct ReadingQuery {
    id: String,
    from: chrono::DateTime<chrono::Utc>,
    until: chrono::DateTime<chrono::Utc>,
}

impl ReadingQuery {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from(&self) -> chrono::DateTime<chrono::Utc> {
        self.from
    }

    pub fn until(&self) -> chrono::DateTime<chrono::Utc> {
        self.until
    }

    pub fn is_valid(&self) -> bool {
        self.from < self.until
    }

    pub fn is_larger_than(&self, duration: chrono::Duration) -> bool {
        self.until - self.from > duration
    }
}
