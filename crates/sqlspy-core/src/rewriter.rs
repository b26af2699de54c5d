//! Class file rewriting: redirect one method through the statement proxy.
//!
//! Given the configured [`RewriteTarget`], a matching class is changed in two
//! places:
//!
//! 1. The original method is kept, byte for byte, under the renamed identity
//!    `name + renamed_suffix` and marked synthetic.
//! 2. A new method with the original name and descriptor takes its slot. It
//!    calls the renamed copy with every argument, wraps the result in
//!    `new Proxy(firstArgument, result)` and returns the proxy.
//!
//! ```text
//! Connection.prepareStatement(sql, a, b):
//!     ps = this.prepareStatement$sqlspy$original(sql, a, b)
//!     return new PreparedStatementProxy(sql, ps)
//! ```
//!
//! [`ModuleRewriter::rewrite`] never fails: anything other than a successful
//! rewrite returns the input bytes untouched.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, info};

use sqlspy_classfile::access::{
    ACC_ABSTRACT, ACC_NATIVE, ACC_PRIVATE, ACC_STATIC, ACC_SYNCHRONIZED, ACC_SYNTHETIC,
};
use sqlspy_classfile::attributes::{CODE, EXCEPTIONS};
use sqlspy_classfile::{ClassFile, CodeBuilder, FieldType, InvokeKind, MethodDescriptor, MethodInfo};
use sqlspy_types::RewriteTarget;

const CONSTRUCTOR: &str = "<init>";

/// Flags removed from the redirect; the renamed copy keeps them.
const REDIRECT_CLEARED_FLAGS: u16 = ACC_SYNCHRONIZED | ACC_NATIVE | ACC_ABSTRACT;

/// What a rewrite did, for logs and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    pub class_name: String,
    pub method: String,
    pub descriptor: String,
    pub renamed_method: String,
    pub proxy_class: String,
    pub proxy_constructor: String,
    /// `invokevirtual`, `invokespecial`, `invokestatic` or `invokeinterface`.
    pub invoke: String,
    pub max_stack: u16,
    pub max_locals: u16,
    pub declared_exceptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Rewritten { bytes: Vec<u8>, report: RewriteReport },
    /// The class is not the target, or has no method with the exact name and descriptor.
    NoMatch,
    /// The renamed identity is already present.
    AlreadyRewritten,
}

/// Normalize `com.example.Type` and `com/example/Type` to the internal form.
pub fn internal_name(identity: &str) -> Cow<'_, str> {
    if identity.contains('.') {
        Cow::Owned(identity.replace('.', "/"))
    } else {
        Cow::Borrowed(identity)
    }
}

fn invoke_name(kind: InvokeKind) -> &'static str {
    match kind {
        InvokeKind::Virtual => "invokevirtual",
        InvokeKind::Special => "invokespecial",
        InvokeKind::Static => "invokestatic",
        InvokeKind::Interface => "invokeinterface",
    }
}

#[derive(Debug, Clone)]
pub struct ModuleRewriter {
    target: RewriteTarget,
}

impl ModuleRewriter {
    pub fn new(target: RewriteTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &RewriteTarget {
        &self.target
    }

    /// Whether `identity` names the configured target class.
    pub fn matches_identity(&self, identity: &str) -> bool {
        internal_name(identity) == self.target.class_name
    }

    /// Rewrite `bytes` if `identity` is the target class; otherwise, and on
    /// any failure, return the input unchanged.
    pub fn rewrite<'a>(&self, identity: &str, bytes: &'a [u8]) -> Cow<'a, [u8]> {
        if !self.matches_identity(identity) {
            return Cow::Borrowed(bytes);
        }
        match self.try_rewrite(bytes) {
            Ok(RewriteOutcome::Rewritten { bytes: out, report }) => {
                info!(
                    class = %report.class_name,
                    method = %report.method,
                    renamed = %report.renamed_method,
                    "redirected method through statement proxy"
                );
                Cow::Owned(out)
            }
            Ok(RewriteOutcome::NoMatch) => {
                debug!(class = %identity, method = %self.target.method, "no matching method");
                Cow::Borrowed(bytes)
            }
            Ok(RewriteOutcome::AlreadyRewritten) => {
                debug!(class = %identity, "class already rewritten");
                Cow::Borrowed(bytes)
            }
            Err(e) => {
                debug!(class = %identity, error = %format!("{:#}", e), "failed to rewrite class");
                Cow::Borrowed(bytes)
            }
        }
    }

    /// Fallible core of [`rewrite`](Self::rewrite). Does not check the identity
    /// passed by the host; the parsed class name decides.
    pub fn try_rewrite(&self, bytes: &[u8]) -> Result<RewriteOutcome> {
        self.target.validate()?;
        let mut class = ClassFile::parse(bytes).context("parse class file")?;
        let class_name = class.class_name()?;
        if class_name != self.target.class_name {
            return Ok(RewriteOutcome::NoMatch);
        }

        let method = &self.target.method;
        let Some(index) = class.find_method(&method.name, &method.descriptor)? else {
            return Ok(RewriteOutcome::NoMatch);
        };
        let renamed = self.target.renamed_name();
        if class.find_method(&renamed, &method.descriptor)?.is_some() {
            return Ok(RewriteOutcome::AlreadyRewritten);
        }

        let descriptor = MethodDescriptor::parse(&method.descriptor)?;
        let first = descriptor
            .params
            .first()
            .filter(|ty| ty.is_reference())
            .cloned()
            .ok_or_else(|| anyhow!("{} must take a reference as its first parameter", method))?;
        let ret = descriptor
            .ret
            .clone()
            .filter(FieldType::is_reference)
            .ok_or_else(|| anyhow!("{} must return a reference", method))?;

        let original = class.methods[index].clone();
        if original.is_abstract_or_native() {
            bail!("{} has no body to preserve", method);
        }
        original
            .code(&class.constant_pool)?
            .ok_or_else(|| anyhow!("{} has no Code attribute", method))?;

        let renamed_copy = MethodInfo {
            access_flags: original.access_flags | ACC_SYNTHETIC,
            name_index: class.constant_pool.add_utf8(&renamed)?,
            descriptor_index: original.descriptor_index,
            attributes: original.attributes.clone(),
        };

        let is_static = original.access_flags & ACC_STATIC != 0;
        let kind = if is_static {
            InvokeKind::Static
        } else if original.access_flags & ACC_PRIVATE != 0 {
            InvokeKind::Special
        } else if class.is_interface() {
            InvokeKind::Interface
        } else {
            InvokeKind::Virtual
        };
        let renamed_ref = if class.is_interface() {
            class
                .constant_pool
                .add_interface_methodref(&class_name, &renamed, &method.descriptor)?
        } else {
            class
                .constant_pool
                .add_methodref(&class_name, &renamed, &method.descriptor)?
        };

        let proxy_class = &self.target.proxy_class;
        let constructor = MethodDescriptor::new(vec![first.clone(), ret.clone()], None);
        let constructor_text = constructor.to_string();
        let proxy_index = class.constant_pool.add_class(proxy_class)?;
        let constructor_ref =
            class
                .constant_pool
                .add_methodref(proxy_class, CONSTRUCTOR, &constructor_text)?;

        let mut code = CodeBuilder::for_method(is_static, &descriptor);
        if !is_static {
            code.load_local(0, &FieldType::object(class_name.as_str()))?;
        }
        let param_slots = CodeBuilder::parameter_slots(is_static, &descriptor);
        for (slot, ty) in param_slots.iter().zip(&descriptor.params) {
            code.load_local(*slot, ty)?;
        }
        code.invoke(kind, renamed_ref, &descriptor)?;
        let result = code.declare_local(&ret)?;
        code.store_local(result, &ret)?;
        code.new_object(proxy_index)?;
        code.dup()?;
        code.load_local(param_slots[0], &first)?;
        code.load_local(result, &ret)?;
        code.invoke(InvokeKind::Special, constructor_ref, &constructor)?;
        code.return_value(Some(&ret))?;
        let code = code.finish()?;
        let (max_stack, max_locals) = (code.max_stack, code.max_locals);

        let mut declared = original.exceptions(&class.constant_pool)?;
        for extra in &self.target.extra_exceptions {
            if !declared.contains(extra) {
                declared.push(extra.clone());
            }
        }
        let declared_refs: Vec<&str> = declared.iter().map(String::as_str).collect();
        let mut redirect = class.build_method(
            original.access_flags & !REDIRECT_CLEARED_FLAGS,
            &method.name,
            &method.descriptor,
            Some(code),
            &declared_refs,
        )?;
        for attribute in &original.attributes {
            let name = class.constant_pool.utf8(attribute.name_index)?;
            if name != CODE && name != EXCEPTIONS {
                redirect.attributes.push(attribute.clone());
            }
        }

        class.methods[index] = redirect;
        class.methods.push(renamed_copy);
        let out = class.to_bytes().context("serialize rewritten class")?;

        Ok(RewriteOutcome::Rewritten {
            bytes: out,
            report: RewriteReport {
                class_name,
                method: method.name.clone(),
                descriptor: method.descriptor.clone(),
                renamed_method: renamed,
                proxy_class: proxy_class.clone(),
                proxy_constructor: constructor_text,
                invoke: invoke_name(kind).to_string(),
                max_stack,
                max_locals,
                declared_exceptions: declared,
            },
        })
    }
}
