/// Static type of a value in the rule environment.
///
/// Mirrors the serialized form of the model structs, so a dotted path such
/// as `postgresql.explain.plan.node_type` can be checked before any query is
/// evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Query,
    Parameter,
    Settings,
    PostgresVariable,
    PostgresExplain,
    PostgresPlan,
    PostgresBuffers,
    MySqlVariable,
    MySqlExplain,
    MySqlQueryBlock,
    MySqlNestedLoop,
    MySqlOrderingOperation,
    MySqlTable,
    /// String-keyed map; any key may be accessed
    Map,
    /// List whose items have the given shape
    List(&'static Shape),
    Scalar
}

const SCALARS: Shape = Shape::List(&Shape::Scalar);

const QUERY: &[(&str, Shape)] = &[
    ("sql", Shape::Scalar),
    ("name", Shape::Scalar),
    ("cmd", Shape::Scalar),
    ("params", Shape::List(&Shape::Parameter)),
    ("filename", Shape::Scalar)
];

const PARAMETER: &[(&str, Shape)] = &[("number", Shape::Scalar)];

const SETTINGS: &[(&str, Shape)] = &[
    ("version", Shape::Scalar),
    ("engine", Shape::Scalar),
    ("schema", SCALARS),
    ("queries", SCALARS)
];

const POSTGRES_VARIABLE: &[(&str, Shape)] = &[("explain", Shape::PostgresExplain)];

const POSTGRES_EXPLAIN: &[(&str, Shape)] = &[
    ("plan", Shape::PostgresPlan),
    ("planning", Shape::PostgresBuffers),
    ("settings", Shape::Map)
];

const POSTGRES_PLAN: &[(&str, Shape)] = &[
    ("node_type", Shape::Scalar),
    ("parent_relationship", Shape::Scalar),
    ("parallel_aware", Shape::Scalar),
    ("async_capable", Shape::Scalar),
    ("startup_cost", Shape::Scalar),
    ("total_cost", Shape::Scalar),
    ("plan_rows", Shape::Scalar),
    ("plan_width", Shape::Scalar),
    ("output", SCALARS),
    ("plans", Shape::List(&Shape::PostgresPlan)),
    ("relation_name", Shape::Scalar),
    ("schema", Shape::Scalar),
    ("alias", Shape::Scalar),
    ("scan_direction", Shape::Scalar),
    ("index_name", Shape::Scalar),
    ("index_cond", Shape::Scalar),
    ("filter", Shape::Scalar),
    ("join_type", Shape::Scalar),
    ("inner_unique", Shape::Scalar),
    ("hash_cond", Shape::Scalar),
    ("merge_cond", Shape::Scalar),
    ("sort_key", SCALARS),
    ("group_key", SCALARS),
    ("strategy", Shape::Scalar),
    ("partial_mode", Shape::Scalar),
    ("operation", Shape::Scalar),
    ("subplan_name", Shape::Scalar),
    ("cte_name", Shape::Scalar),
    ("shared_hit_blocks", Shape::Scalar),
    ("shared_read_blocks", Shape::Scalar),
    ("shared_dirtied_blocks", Shape::Scalar),
    ("shared_written_blocks", Shape::Scalar),
    ("local_hit_blocks", Shape::Scalar),
    ("local_read_blocks", Shape::Scalar),
    ("local_dirtied_blocks", Shape::Scalar),
    ("local_written_blocks", Shape::Scalar),
    ("temp_read_blocks", Shape::Scalar),
    ("temp_written_blocks", Shape::Scalar)
];

const POSTGRES_BUFFERS: &[(&str, Shape)] = &[
    ("shared_hit_blocks", Shape::Scalar),
    ("shared_read_blocks", Shape::Scalar),
    ("shared_dirtied_blocks", Shape::Scalar),
    ("shared_written_blocks", Shape::Scalar),
    ("local_hit_blocks", Shape::Scalar),
    ("local_read_blocks", Shape::Scalar),
    ("local_dirtied_blocks", Shape::Scalar),
    ("local_written_blocks", Shape::Scalar),
    ("temp_read_blocks", Shape::Scalar),
    ("temp_written_blocks", Shape::Scalar)
];

const MYSQL_VARIABLE: &[(&str, Shape)] = &[("explain", Shape::MySqlExplain)];

const MYSQL_EXPLAIN: &[(&str, Shape)] = &[("query_block", Shape::MySqlQueryBlock)];

const MYSQL_QUERY_BLOCK: &[(&str, Shape)] = &[
    ("select_id", Shape::Scalar),
    ("message", Shape::Scalar),
    ("cost_info", Shape::Map),
    ("table", Shape::MySqlTable),
    ("nested_loop", Shape::List(&Shape::MySqlNestedLoop)),
    ("ordering_operation", Shape::MySqlOrderingOperation)
];

const MYSQL_NESTED_LOOP: &[(&str, Shape)] = &[("table", Shape::MySqlTable)];

const MYSQL_ORDERING_OPERATION: &[(&str, Shape)] = &[
    ("using_filesort", Shape::Scalar),
    ("cost_info", Shape::Map),
    ("table", Shape::MySqlTable),
    ("nested_loop", Shape::List(&Shape::MySqlNestedLoop))
];

const MYSQL_TABLE: &[(&str, Shape)] = &[
    ("table_name", Shape::Scalar),
    ("access_type", Shape::Scalar),
    ("rows_examined_per_scan", Shape::Scalar),
    ("rows_produced_per_join", Shape::Scalar),
    ("filtered", Shape::Scalar),
    ("cost_info", Shape::Map),
    ("used_columns", SCALARS),
    ("possible_keys", SCALARS),
    ("key", Shape::Scalar),
    ("used_key_parts", SCALARS),
    ("key_length", Shape::Scalar),
    ("ref", SCALARS),
    ("attached_condition", Shape::Scalar),
    ("insert", Shape::Scalar),
    ("update", Shape::Scalar),
    ("delete", Shape::Scalar)
];

impl Shape {
    /// Shape of a top-level environment variable
    pub fn of_variable(name: &str) -> Option<Self> {
        match name {
            "query" => Some(Self::Query),
            "config" => Some(Self::Settings),
            "postgresql" => Some(Self::PostgresVariable),
            "mysql" => Some(Self::MySqlVariable),
            _ => None
        }
    }

    /// Named fields, in serialization order; empty for maps, lists and
    /// scalars
    pub fn fields(self) -> &'static [(&'static str, Shape)] {
        match self {
            Self::Query => QUERY,
            Self::Parameter => PARAMETER,
            Self::Settings => SETTINGS,
            Self::PostgresVariable => POSTGRES_VARIABLE,
            Self::PostgresExplain => POSTGRES_EXPLAIN,
            Self::PostgresPlan => POSTGRES_PLAN,
            Self::PostgresBuffers => POSTGRES_BUFFERS,
            Self::MySqlVariable => MYSQL_VARIABLE,
            Self::MySqlExplain => MYSQL_EXPLAIN,
            Self::MySqlQueryBlock => MYSQL_QUERY_BLOCK,
            Self::MySqlNestedLoop => MYSQL_NESTED_LOOP,
            Self::MySqlOrderingOperation => MYSQL_ORDERING_OPERATION,
            Self::MySqlTable => MYSQL_TABLE,
            Self::Map | Self::List(_) | Self::Scalar => &[]
        }
    }

    /// Shape of `self.name`, if such a field exists
    pub fn field(self, name: &str) -> Option<Self> {
        self.fields()
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, shape)| *shape)
    }
}
