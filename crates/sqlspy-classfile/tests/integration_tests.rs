//! End-to-end checks of the class file codec on assembled classes.

use sqlspy_classfile::access::{ACC_PUBLIC, ACC_STATIC, ACC_SUPER, ACC_SYNCHRONIZED};
use sqlspy_classfile::attributes::AttributeInfo;
use sqlspy_classfile::{
    ClassFile, ClassFileError, CodeBuilder, Constant, FieldType, InvokeKind, MethodDescriptor,
};

fn identity_body(is_static: bool, desc: &MethodDescriptor) -> sqlspy_classfile::CodeAttribute {
    let mut code = CodeBuilder::for_method(is_static, desc);
    let slot = CodeBuilder::parameter_slots(is_static, desc)[0];
    code.load_local(slot, &desc.params[0]).unwrap();
    code.return_value(desc.ret.as_ref()).unwrap();
    code.finish().unwrap()
}

fn build_class() -> ClassFile {
    let mut class = ClassFile::new("org/example/Store", Some("java/lang/Object"), ACC_PUBLIC | ACC_SUPER)
        .unwrap();
    class.constant_pool.add(Constant::Long(7)).unwrap();
    class.constant_pool.add(Constant::Double(2.5f64.to_bits())).unwrap();

    for (flags, name, text) in [
        (ACC_PUBLIC, "echo", "(Ljava/lang/String;)Ljava/lang/String;"),
        (ACC_PUBLIC | ACC_SYNCHRONIZED, "echo", "(Ljava/lang/Object;)Ljava/lang/Object;"),
        (ACC_PUBLIC | ACC_STATIC, "twice", "(J)J"),
    ] {
        let desc = MethodDescriptor::parse(text).unwrap();
        let body = identity_body(flags & ACC_STATIC != 0, &desc);
        class.add_method(flags, name, text, Some(body), &[]).unwrap();
    }

    let source = class.constant_pool.add_utf8("SourceFile").unwrap();
    let file = class.constant_pool.add_utf8("Store.java").unwrap();
    class
        .attributes
        .push(AttributeInfo::new(source, file.to_be_bytes().to_vec()));
    class
}

#[test]
fn test_assembled_class_roundtrips() {
    let class = build_class();
    let bytes = class.to_bytes().unwrap();
    let parsed = ClassFile::parse(&bytes).unwrap();

    assert_eq!(parsed.to_bytes().unwrap(), bytes, "re-encode must be byte identical");
    assert_eq!(parsed.class_name().unwrap(), "org/example/Store");
    assert_eq!(
        parsed.method_signatures().unwrap(),
        vec![
            ("echo".to_string(), "(Ljava/lang/String;)Ljava/lang/String;".to_string()),
            ("echo".to_string(), "(Ljava/lang/Object;)Ljava/lang/Object;".to_string()),
            ("twice".to_string(), "(J)J".to_string()),
        ]
    );
}

#[test]
fn test_overloads_resolve_by_exact_descriptor() {
    let class = build_class();
    assert_eq!(
        class.find_method("echo", "(Ljava/lang/Object;)Ljava/lang/Object;").unwrap(),
        Some(1)
    );
    assert_eq!(class.find_method("echo", "(I)I").unwrap(), None);
    assert_eq!(class.find_method("Echo", "(Ljava/lang/String;)Ljava/lang/String;").unwrap(), None);
}

#[test]
fn test_static_wide_body_bookkeeping() {
    let class = build_class();
    let code = class.methods[2].code(&class.constant_pool).unwrap().unwrap();
    assert_eq!(code.max_stack, 2);
    assert_eq!(code.max_locals, 2);
}

#[test]
fn test_method_refs_are_interned_once() {
    let mut class = build_class();
    let before = class.constant_pool.count();
    let a = class
        .constant_pool
        .add_methodref("org/example/Store", "twice", "(J)J")
        .unwrap();
    let after_first = class.constant_pool.count();
    let b = class
        .constant_pool
        .add_methodref("org/example/Store", "twice", "(J)J")
        .unwrap();
    assert_eq!(a, b);
    assert!(after_first > before);
    assert_eq!(class.constant_pool.count(), after_first);

    let desc = MethodDescriptor::parse("(J)J").unwrap();
    let mut code = CodeBuilder::for_method(true, &desc);
    code.load_local(0, &FieldType::Long).unwrap();
    code.invoke(InvokeKind::Static, a, &desc).unwrap();
    code.return_value(desc.ret.as_ref()).unwrap();
    let body = code.finish().unwrap();
    class.add_method(ACC_STATIC, "call", "(J)J", Some(body), &[]).unwrap();

    let parsed = ClassFile::parse(&class.to_bytes().unwrap()).unwrap();
    let member = parsed.constant_pool.member_ref(a).unwrap();
    assert_eq!(member.name, "twice");
    assert_eq!(member.class_name, "org/example/Store");
}

#[test]
fn test_garbage_is_rejected() {
    assert!(matches!(
        ClassFile::parse(b"not a class").unwrap_err(),
        ClassFileError::BadMagic(_)
    ));
    assert!(matches!(
        ClassFile::parse(&[]).unwrap_err(),
        ClassFileError::UnexpectedEof { .. }
    ));
}
