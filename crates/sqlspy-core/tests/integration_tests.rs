//! End-to-end checks: rewriting a connection class, and the proxy it installs.

use std::borrow::Cow;
use std::sync::Arc;

use sqlspy_classfile::access::{ACC_PUBLIC, ACC_SUPER, ACC_SYNTHETIC};
use sqlspy_classfile::opcodes::{ARETURN, INVOKESPECIAL, NEW};
use sqlspy_classfile::{ClassFile, CodeBuilder, InvokeKind, MethodDescriptor};
use sqlspy_core::connection::{Connection, SpyConnection, CONCUR_READ_ONLY, TYPE_FORWARD_ONLY};
use sqlspy_core::testing::{RecordingConnection, RecordingStatement};
use sqlspy_core::{ModuleTransformer, PreparedStatement, StatementProxy, StatementTransformer};
use sqlspy_types::{MemorySink, ProxySettings, RewriteTarget};
use tracing::Level;

const CONNECTION: &str = "com/mysql/jdbc/ConnectionImpl";
const PREPARE: &str = "(Ljava/lang/String;II)Ljava/sql/PreparedStatement;";

/// `prepareStatement(sql, type, concurrency)` delegating to `clientPrepare(sql)`,
/// plus an unrelated `close()`.
fn connection_class() -> Vec<u8> {
    let mut class = ClassFile::new(CONNECTION, Some("java/lang/Object"), ACC_PUBLIC | ACC_SUPER)
        .unwrap();
    let client_desc = "(Ljava/lang/String;)Ljava/sql/PreparedStatement;";
    let client = class
        .constant_pool
        .add_methodref(CONNECTION, "clientPrepare", client_desc)
        .unwrap();

    let desc = MethodDescriptor::parse(PREPARE).unwrap();
    let mut code = CodeBuilder::for_method(false, &desc);
    code.load_local(0, &sqlspy_classfile::FieldType::object(CONNECTION))
        .unwrap();
    code.load_local(1, &desc.params[0]).unwrap();
    code.invoke(
        InvokeKind::Virtual,
        client,
        &MethodDescriptor::parse(client_desc).unwrap(),
    )
    .unwrap();
    code.return_value(desc.ret.as_ref()).unwrap();
    class
        .add_method(
            ACC_PUBLIC,
            "prepareStatement",
            PREPARE,
            Some(code.finish().unwrap()),
            &["java/sql/SQLException"],
        )
        .unwrap();

    let mut close = CodeBuilder::for_method(false, &MethodDescriptor::parse("()V").unwrap());
    close.return_value(None).unwrap();
    class
        .add_method(ACC_PUBLIC, "close", "()V", Some(close.finish().unwrap()), &[])
        .unwrap();
    class.to_bytes().unwrap()
}

#[test]
fn test_end_to_end_literal_sql() {
    let sink = MemorySink::shared();
    let proxy = StatementProxy::new(
        "SELECT * FROM t WHERE id=? AND name=?",
        RecordingStatement::new(),
        ProxySettings::default(),
        sink.clone(),
    );
    proxy.set_int(1, 42).unwrap();
    proxy.set_string(2, "O'Brien").unwrap();
    assert_eq!(proxy.execute_query().unwrap(), "rows");

    let events = sink.statements();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].operation, "execute_query()");
    assert_eq!(
        events[0].literal_sql,
        "SELECT * FROM t WHERE id=42 AND name='O''Brien'"
    );
    assert!(events[0]
        .banner()
        .contains("\nSELECT * FROM t WHERE id=42 AND name='O''Brien'\n"));
}

#[test]
fn test_spy_connection_matches_rewritten_shape() {
    let sink = MemorySink::shared();
    let conn = SpyConnection::new(
        RecordingConnection::default(),
        ProxySettings {
            type_hints: true,
            ..ProxySettings::default()
        },
        sink.clone(),
    );
    let stmt = conn
        .prepare_statement("INSERT INTO t VALUES (?, ?)", TYPE_FORWARD_ONLY, CONCUR_READ_ONLY)
        .unwrap();
    stmt.set_int(1, 1).unwrap();
    stmt.set_boolean(2, true).unwrap();
    stmt.execute().unwrap();
    stmt.clear_parameters().unwrap();
    stmt.execute().unwrap();

    assert_eq!(
        sink.literal_sql(),
        vec![
            "INSERT INTO t VALUES ((int)1, (boolean)true)",
            "INSERT INTO t VALUES (?, ?)",
        ]
    );
    assert_eq!(
        stmt.real().calls(),
        vec!["set_int(1, 1)", "set_boolean(2, true)", "execute()", "clear_parameters()", "execute()"]
    );
}

#[test]
fn test_concurrent_binds_and_clears() {
    let proxy = StatementProxy::new(
        "? ? ? ? ? ? ? ?",
        RecordingStatement::new(),
        ProxySettings::default(),
        MemorySink::shared(),
    );

    std::thread::scope(|scope| {
        for position in 1..=8usize {
            let proxy = &proxy;
            scope.spawn(move || {
                for _ in 0..200 {
                    proxy.set_int(position, position as i32).unwrap();
                }
            });
        }
        let proxy = &proxy;
        scope.spawn(move || {
            for _ in 0..50 {
                proxy.clear_parameters().unwrap();
            }
        });
    });

    let snapshot = proxy.trace().snapshot();
    assert!(snapshot.len() <= 8);
    for (i, slot) in snapshot.iter().enumerate() {
        if let Some(text) = slot {
            assert_eq!(text, &(i + 1).to_string());
        }
    }

    for position in 1..=8usize {
        proxy.set_int(position, position as i32).unwrap();
    }
    assert_eq!(proxy.literal_sql(), "1 2 3 4 5 6 7 8");
    assert_eq!(proxy.real().calls().len(), 8 * 200 + 50 + 8);
}

#[test]
fn test_rewrite_connection_class() {
    let sink = MemorySink::shared();
    let transformer = StatementTransformer::new(RewriteTarget::default(), sink.clone());
    let input = connection_class();
    let original = ClassFile::parse(&input).unwrap();

    let out = transformer.transform("com.mysql.jdbc.ConnectionImpl", &input);
    assert!(matches!(out, Cow::Owned(_)));
    let class = ClassFile::parse(&out).unwrap();
    let pool = &class.constant_pool;

    // close() is untouched, the redirect keeps the original slot
    assert_eq!(class.methods.len(), 3);
    assert_eq!(class.methods[1].attributes, original.methods[1].attributes);

    let renamed = class
        .find_method("prepareStatement$sqlspy$original", PREPARE)
        .unwrap()
        .unwrap();
    let renamed = &class.methods[renamed];
    assert_eq!(renamed.access_flags, ACC_PUBLIC | ACC_SYNTHETIC);
    assert_eq!(
        renamed.code(pool).unwrap().unwrap().code,
        original.methods[0].code(&original.constant_pool).unwrap().unwrap().code
    );

    let redirect = &class.methods[class.find_method("prepareStatement", PREPARE).unwrap().unwrap()];
    let code = redirect.code(pool).unwrap().unwrap();
    let new_at = code.code.iter().position(|op| *op == NEW).unwrap();
    let proxy_class = u16::from_be_bytes([code.code[new_at + 1], code.code[new_at + 2]]);
    assert_eq!(pool.class_name(proxy_class).unwrap(), "com/sqlspy/PreparedStatementProxy");

    let init_at = code.code.len() - 4;
    assert_eq!(code.code[init_at], INVOKESPECIAL);
    let init = pool
        .member_ref(u16::from_be_bytes([code.code[init_at + 1], code.code[init_at + 2]]))
        .unwrap();
    assert_eq!(init.name, "<init>");
    assert_eq!(
        init.descriptor,
        "(Ljava/lang/String;Ljava/sql/PreparedStatement;)V"
    );
    assert_eq!(code.code[code.code.len() - 1], ARETURN);
    assert_eq!(
        redirect.exceptions(pool).unwrap(),
        vec!["java/sql/SQLException".to_string()]
    );

    let stats = transformer.stats();
    assert_eq!((stats.inspected, stats.rewritten), (1, 1));
    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, Level::INFO);

    // a second pass over the rewritten bytes is a no-op
    let again = transformer.transform(CONNECTION, &out);
    assert!(matches!(again, Cow::Borrowed(b) if b == &out[..]));
    assert_eq!(transformer.stats().already_rewritten, 1);
}

#[test]
fn test_non_matching_modules_pass_through() {
    let input = connection_class();
    let other_method = RewriteTarget {
        method: sqlspy_types::MethodSignature::new("prepareCall", PREPARE),
        ..RewriteTarget::default()
    };
    let sink = MemorySink::shared();
    let transformer = StatementTransformer::new(other_method, sink.clone());
    let out = transformer.transform(CONNECTION, &input);
    assert_eq!(&*out, &input[..]);
    assert_eq!(transformer.stats().no_match, 1);
    assert_eq!(sink.diagnostics()[0].level, Level::DEBUG);

    let transformer = StatementTransformer::new(RewriteTarget::default(), Arc::new(MemorySink::new()));
    let out = transformer.transform("org/example/Other", &input);
    assert!(matches!(out, Cow::Borrowed(_)));
}
