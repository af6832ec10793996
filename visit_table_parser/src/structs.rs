#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisitTable {
    pub records: Vec<VisitRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisitRecord {
    // line number in the source file, header is line 1
    pub line: usize,
    pub entity_id: String,
    pub resource_id: String,
    pub ready_time: f64,
    pub duration: f64,
    pub due_time: f64,
    pub transfer_time: Option<f64>,
    pub sequence_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CapacityTable {
    pub records: Vec<CapacityRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapacityRecord {
    pub line: usize,
    pub resource_id: String,
    pub server_count: i64,
}
