use asupersync::runtime::RuntimeBuilder;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use rowmap::prelude::*;
use rowmap::{
    ColumnDescriptor, FieldDescriptor, IndexSettings, Row, SearchRequest,
};

fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

fn block_on<T>(future: impl Future<Output = T>) -> T {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    rt.block_on(future)
}

// ==================== mock executor ====================

#[derive(Default)]
struct ExecState {
    executed: Vec<(String, Vec<Value>)>,
    insert_result: Option<Value>,
    select_results: VecDeque<Vec<Row>>,
}

#[derive(Clone)]
struct MockExecutor {
    state: Arc<Mutex<ExecState>>,
}

impl Executor for MockExecutor {
    fn exec(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let state = Arc::clone(&self.state);
        let sql = sql.to_string();
        let params = params.to_vec();
        async move {
            state
                .lock()
                .expect("lock poisoned")
                .executed
                .push((sql, params));
            Outcome::Ok(1)
        }
    }

    fn insert(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Value, Error>> + Send {
        let state = Arc::clone(&self.state);
        let sql = sql.to_string();
        let params = params.to_vec();
        async move {
            let mut guard = state.lock().expect("lock poisoned");
            guard.executed.push((sql, params));
            Outcome::Ok(guard.insert_result.clone().unwrap_or(Value::Null))
        }
    }

    fn insert_many(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Value>, Error>> + Send {
        let state = Arc::clone(&self.state);
        let sql = sql.to_string();
        let params = params.to_vec();
        async move {
            state
                .lock()
                .expect("lock poisoned")
                .executed
                .push((sql, params));
            Outcome::Ok(Vec::new())
        }
    }

    fn select(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        let state = Arc::clone(&self.state);
        let sql = sql.to_string();
        let params = params.to_vec();
        async move {
            let mut guard = state.lock().expect("lock poisoned");
            guard.executed.push((sql, params));
            Outcome::Ok(guard.select_results.pop_front().unwrap_or_default())
        }
    }

    fn select_one(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        let state = Arc::clone(&self.state);
        let sql = sql.to_string();
        let params = params.to_vec();
        async move {
            state
                .lock()
                .expect("lock poisoned")
                .executed
                .push((sql, params));
            Outcome::Ok(None)
        }
    }

    fn count(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<i64, Error>> + Send {
        let state = Arc::clone(&self.state);
        let sql = sql.to_string();
        let params = params.to_vec();
        async move {
            state
                .lock()
                .expect("lock poisoned")
                .executed
                .push((sql, params));
            Outcome::Ok(0)
        }
    }
}

// ==================== mock search index ====================

#[derive(Default)]
struct IndexState {
    operations: Vec<String>,
    search_terms: Vec<String>,
    search_results: VecDeque<Vec<serde_json::Value>>,
    added: Vec<Vec<serde_json::Value>>,
    updated: Vec<Vec<serde_json::Value>>,
    deleted_ids: Vec<String>,
    get_result: Option<serde_json::Value>,
    fail_update: bool,
    fail_delete: bool,
}

#[derive(Clone)]
struct MockIndex {
    state: Arc<Mutex<IndexState>>,
}

fn index_error() -> Error {
    Error::Custom("index unavailable".to_string())
}

impl SearchIndex for MockIndex {
    fn add_documents(
        &self,
        _cx: &Cx,
        _index: &str,
        documents: &[serde_json::Value],
    ) -> impl Future<Output = Outcome<(), Error>> + Send {
        let state = Arc::clone(&self.state);
        let documents = documents.to_vec();
        async move {
            let mut guard = state.lock().expect("lock poisoned");
            guard.operations.push("add".to_string());
            guard.added.push(documents);
            Outcome::Ok(())
        }
    }

    fn update_documents(
        &self,
        _cx: &Cx,
        _index: &str,
        documents: &[serde_json::Value],
    ) -> impl Future<Output = Outcome<(), Error>> + Send {
        let state = Arc::clone(&self.state);
        let documents = documents.to_vec();
        async move {
            let mut guard = state.lock().expect("lock poisoned");
            guard.operations.push("update".to_string());
            if guard.fail_update {
                return Outcome::Err(index_error());
            }
            guard.updated.push(documents);
            Outcome::Ok(())
        }
    }

    fn delete_document(
        &self,
        _cx: &Cx,
        _index: &str,
        id: &str,
    ) -> impl Future<Output = Outcome<(), Error>> + Send {
        let state = Arc::clone(&self.state);
        let id = id.to_string();
        async move {
            let mut guard = state.lock().expect("lock poisoned");
            guard.operations.push(format!("delete:{id}"));
            if guard.fail_delete {
                return Outcome::Err(index_error());
            }
            guard.deleted_ids.push(id);
            Outcome::Ok(())
        }
    }

    fn get_document(
        &self,
        _cx: &Cx,
        _index: &str,
        _id: &str,
    ) -> impl Future<Output = Outcome<Option<serde_json::Value>, Error>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            let mut guard = state.lock().expect("lock poisoned");
            guard.operations.push("get".to_string());
            Outcome::Ok(guard.get_result.take())
        }
    }

    fn search(
        &self,
        _cx: &Cx,
        _index: &str,
        term: &str,
        _filters: &[(String, serde_json::Value)],
        _options: &SearchOptions,
    ) -> impl Future<Output = Outcome<Vec<serde_json::Value>, Error>> + Send {
        let state = Arc::clone(&self.state);
        let term = term.to_string();
        async move {
            let mut guard = state.lock().expect("lock poisoned");
            guard.operations.push("search".to_string());
            guard.search_terms.push(term);
            Outcome::Ok(guard.search_results.pop_front().unwrap_or_default())
        }
    }

    fn multi_search(
        &self,
        _cx: &Cx,
        requests: &[SearchRequest],
    ) -> impl Future<Output = Outcome<Vec<Vec<serde_json::Value>>, Error>> + Send {
        let state = Arc::clone(&self.state);
        let count = requests.len();
        let indexes: Vec<String> = requests.iter().map(|r| r.index.clone()).collect();
        async move {
            let mut guard = state.lock().expect("lock poisoned");
            guard.operations.push(format!("multi_search:{count}"));
            assert!(indexes.iter().all(|i| i == "rooms"));
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(guard.search_results.pop_front().unwrap_or_default());
            }
            Outcome::Ok(out)
        }
    }

    fn clear(&self, _cx: &Cx, _index: &str) -> impl Future<Output = Outcome<(), Error>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            state
                .lock()
                .expect("lock poisoned")
                .operations
                .push("clear".to_string());
            Outcome::Ok(())
        }
    }

    fn update_settings(
        &self,
        _cx: &Cx,
        _index: &str,
        _settings: &IndexSettings,
    ) -> impl Future<Output = Outcome<(), Error>> + Send {
        let state = Arc::clone(&self.state);
        async move {
            state
                .lock()
                .expect("lock poisoned")
                .operations
                .push("settings".to_string());
            Outcome::Ok(())
        }
    }
}

// ==================== entity ====================

#[derive(Debug, Clone, Default)]
struct Room {
    id: i64,
    name: String,
    deleted: bool,
}

static ROOM_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::Column(ColumnDescriptor::new("id", ScalarKind::Int).primary_key()),
    FieldDescriptor::column("name", ScalarKind::Text),
];
static ROOM: EntityDescriptor = EntityDescriptor::new(&ROOM_FIELDS).soft_delete("deleted_at");

impl Entity for Room {
    const TABLE: &'static str = "rooms";
    const ALIAS: &'static str = "r";

    fn descriptor() -> &'static EntityDescriptor {
        &ROOM
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::BigInt(self.id)),
            ("name", Value::Text(self.name.clone())),
        ]
    }

    fn from_reader(reader: &mut RowReader<'_>) -> Result<Self> {
        Ok(Self {
            id: reader.column()?,
            name: reader.column()?,
            deleted: false,
        })
    }

    fn primary_key(&self) -> Value {
        Value::BigInt(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RoomDoc {
    id: i64,
    name: String,
}

impl IndexableEntity for Room {
    type Document = RoomDoc;

    fn index_document(&self) -> RoomDoc {
        RoomDoc {
            id: self.id,
            name: self.name.clone(),
        }
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_primary_key(&mut self, key: Value) {
        self.id = key.as_i64().unwrap_or_default();
    }
}

fn fixture(
    exec_state: ExecState,
    index_state: IndexState,
) -> (
    IndexedRepository<Room, i64, MockExecutor, MockIndex>,
    Arc<Mutex<ExecState>>,
    Arc<Mutex<IndexState>>,
) {
    let exec_state = Arc::new(Mutex::new(exec_state));
    let index_state = Arc::new(Mutex::new(index_state));
    let repo = Repository::new(MockExecutor {
        state: Arc::clone(&exec_state),
    });
    let indexed = IndexedRepository::new(
        repo,
        MockIndex {
            state: Arc::clone(&index_state),
        },
        "rooms",
    );
    (indexed, exec_state, index_state)
}

// ==================== tests ====================

#[test]
fn create_pushes_the_index_document_under_the_generated_key() {
    let cx = Cx::for_testing();
    let (indexed, exec_state, index_state) = fixture(
        ExecState {
            insert_result: Some(Value::BigInt(42)),
            ..ExecState::default()
        },
        IndexState::default(),
    );

    let room = Room {
        name: "Suite".to_string(),
        ..Room::default()
    };

    block_on(async {
        let id = unwrap_outcome(indexed.create(&cx, room).await);
        assert_eq!(id, 42);
    });

    // row write first, then the index push
    assert!(!exec_state.lock().unwrap().executed.is_empty());
    let guard = index_state.lock().unwrap();
    assert_eq!(guard.updated.len(), 1);
    assert_eq!(
        guard.updated[0][0],
        serde_json::json!({"id": 42, "name": "Suite"})
    );
}

#[test]
fn index_failure_never_fails_the_write() {
    let cx = Cx::for_testing();
    let (indexed, _, index_state) = fixture(
        ExecState {
            insert_result: Some(Value::BigInt(1)),
            ..ExecState::default()
        },
        IndexState {
            fail_update: true,
            fail_delete: true,
            ..IndexState::default()
        },
    );

    block_on(async {
        let id = unwrap_outcome(
            indexed
                .create(
                    &cx,
                    Room {
                        name: "Suite".to_string(),
                        ..Room::default()
                    },
                )
                .await,
        );
        assert_eq!(id, 1);

        unwrap_outcome(
            indexed
                .update(
                    &cx,
                    &Room {
                        id: 1,
                        name: "Suite".to_string(),
                        deleted: false,
                    },
                )
                .await,
        );

        unwrap_outcome(indexed.delete(&cx, &1).await);
    });

    let guard = index_state.lock().unwrap();
    assert!(guard.updated.is_empty());
    assert!(guard.deleted_ids.is_empty());
}

#[test]
fn soft_deleted_entities_are_never_pushed() {
    let cx = Cx::for_testing();
    let (indexed, _, index_state) = fixture(ExecState::default(), IndexState::default());

    let room = Room {
        id: 3,
        name: "Old".to_string(),
        deleted: true,
    };

    block_on(async {
        unwrap_outcome(indexed.update_index(&cx, &room).await);
    });

    assert!(index_state.lock().unwrap().operations.is_empty());
}

#[test]
fn delete_removes_the_row_then_the_document() {
    let cx = Cx::for_testing();
    let (indexed, exec_state, index_state) = fixture(ExecState::default(), IndexState::default());

    block_on(async {
        unwrap_outcome(indexed.delete(&cx, &7).await);
    });

    let exec_guard = exec_state.lock().unwrap();
    let (sql, _) = &exec_guard.executed[0];
    assert!(sql.starts_with("UPDATE rooms SET deleted_at ="));

    let index_guard = index_state.lock().unwrap();
    assert_eq!(index_guard.deleted_ids, vec!["7"]);
}

#[test]
fn zero_hit_search_retries_with_the_switched_layout() {
    let cx = Cx::for_testing();
    let (indexed, _, index_state) = fixture(
        ExecState::default(),
        IndexState {
            search_results: VecDeque::from([
                Vec::new(),
                vec![serde_json::json!({"id": 1, "name": "привет"})],
            ]),
            ..IndexState::default()
        },
    );

    let documents = block_on(async {
        unwrap_outcome(
            indexed
                .search_by_term(&cx, "ghbdtn", &[], &SearchOptions::new())
                .await,
        )
    });

    assert_eq!(documents.len(), 1);
    let guard = index_state.lock().unwrap();
    assert_eq!(guard.search_terms, vec!["ghbdtn", "привет"]);
}

#[test]
fn short_terms_are_not_retried() {
    let cx = Cx::for_testing();
    let (indexed, _, index_state) = fixture(ExecState::default(), IndexState::default());

    let documents = block_on(async {
        unwrap_outcome(
            indexed
                .search_by_term(&cx, "ab", &[], &SearchOptions::new())
                .await,
        )
    });

    assert!(documents.is_empty());
    assert_eq!(index_state.lock().unwrap().search_terms, vec!["ab"]);
}

#[test]
fn get_value_decodes_or_reports_not_found() {
    let cx = Cx::for_testing();
    let (indexed, _, index_state) = fixture(
        ExecState::default(),
        IndexState {
            get_result: Some(serde_json::json!({"id": 5, "name": "Suite"})),
            ..IndexState::default()
        },
    );

    block_on(async {
        let document = unwrap_outcome(indexed.get_value(&cx, &5).await);
        assert_eq!(
            document,
            RoomDoc {
                id: 5,
                name: "Suite".to_string()
            }
        );

        // the mock consumed its document; the next lookup misses
        match indexed.get_value(&cx, &5).await {
            Outcome::Err(err) => assert!(err.is_not_found()),
            other => panic!("expected NotFound, got {other:?}"),
        }
    });

    assert_eq!(
        index_state.lock().unwrap().operations,
        vec!["get", "get"]
    );
}

#[test]
fn multi_search_pins_requests_to_the_decorator_index() {
    let cx = Cx::for_testing();
    let (indexed, _, index_state) = fixture(
        ExecState::default(),
        IndexState {
            search_results: VecDeque::from([
                vec![serde_json::json!({"id": 1, "name": "A"})],
                Vec::new(),
            ]),
            ..IndexState::default()
        },
    );

    let results = block_on(async {
        unwrap_outcome(
            indexed
                .multi_search(
                    &cx,
                    vec![
                        SearchRequest {
                            term: "a".to_string(),
                            ..SearchRequest::default()
                        },
                        SearchRequest {
                            term: "b".to_string(),
                            ..SearchRequest::default()
                        },
                    ],
                )
                .await,
        )
    });

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].len(), 1);
    assert!(results[1].is_empty());
    assert_eq!(
        index_state.lock().unwrap().operations,
        vec!["multi_search:2"]
    );
}

#[test]
fn reindex_clears_applies_settings_and_pages_until_empty() {
    let cx = Cx::for_testing();

    let page = vec![
        Row::positional(vec![Value::BigInt(1), Value::Text("A".to_string())]),
        Row::positional(vec![Value::BigInt(2), Value::Text("B".to_string())]),
    ];

    let (indexed, exec_state, index_state) = fixture(
        ExecState {
            select_results: VecDeque::from([page, Vec::new()]),
            ..ExecState::default()
        },
        IndexState::default(),
    );
    let indexed = indexed.with_settings(IndexSettings {
        searchable_attributes: vec!["name".to_string()],
        ..IndexSettings::default()
    });

    block_on(async {
        unwrap_outcome(indexed.reindex(&cx).await);
    });

    let index_guard = index_state.lock().unwrap();
    assert_eq!(index_guard.operations, vec!["clear", "settings", "add"]);
    assert_eq!(index_guard.added.len(), 1);
    assert_eq!(index_guard.added[0].len(), 2);

    let exec_guard = exec_state.lock().unwrap();
    assert_eq!(exec_guard.executed.len(), 2);
    let (first_sql, _) = &exec_guard.executed[0];
    assert_eq!(
        first_sql,
        "SELECT r.id, r.name FROM rooms AS r WHERE r.deleted_at IS NULL \
         ORDER BY r.id ASC LIMIT 500 OFFSET 0"
    );
    let (second_sql, _) = &exec_guard.executed[1];
    assert!(second_sql.ends_with("LIMIT 500 OFFSET 500"));
}
