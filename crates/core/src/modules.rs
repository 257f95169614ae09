//! Per-namespace module type registry.
//!
//! Every active namespace owns a [`ModuleSet`]: the server's business modules
//! (`Accounts`, `Contacts`, ...) keyed by name and resolved at lookup time.
//! Two sessions pointed at servers with different schemas, or extended
//! differently, never see each other's definitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use crm_protocol::FieldInfo;
use serde_json::Value;

/// Hook applied to a module definition when it is registered.
///
/// Extensions are registered on the [`SessionRegistry`](crate::SessionRegistry)
/// and applied to the matching module in every namespace.
pub trait ModuleExtension: Send + Sync {
	/// Unique extension name.
	fn name(&self) -> &str;

	/// Name of the module this extension targets.
	fn module(&self) -> &str;

	/// Mutates the module definition. Called once per namespace.
	fn apply(&self, _module: &mut Module) {}
}

/// One business module as known to one namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
	name: String,
	fields: Option<BTreeMap<String, FieldInfo>>,
	extensions: Vec<String>,
	attributes: BTreeMap<String, Value>,
}

impl Module {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			fields: None,
			extensions: Vec::new(),
			attributes: BTreeMap::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Field descriptions, once fetched.
	pub fn fields(&self) -> Option<&BTreeMap<String, FieldInfo>> {
		self.fields.as_ref()
	}

	pub fn set_fields(&mut self, fields: BTreeMap<String, FieldInfo>) {
		self.fields = Some(fields);
	}

	/// Returns true once any extension has been applied.
	pub fn is_extended(&self) -> bool {
		!self.extensions.is_empty()
	}

	/// Names of applied extensions, in application order.
	pub fn extensions(&self) -> &[String] {
		&self.extensions
	}

	pub fn attribute(&self, key: &str) -> Option<&Value> {
		self.attributes.get(key)
	}

	pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
		self.attributes.insert(key.into(), value);
	}

	/// Applies `extension` unless it is already applied.
	pub fn extend(&mut self, extension: &dyn ModuleExtension) {
		if self.extensions.iter().any(|e| e == extension.name()) {
			return;
		}
		extension.apply(self);
		self.extensions.push(extension.name().to_string());
	}
}

/// Module definitions of one namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleSet {
	modules: BTreeMap<String, Module>,
}

impl ModuleSet {
	/// Builds definitions for `names`, applying every matching extension.
	pub fn new<I, S>(names: I, extensions: &[Arc<dyn ModuleExtension>]) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = Self {
			modules: names
				.into_iter()
				.map(|name| {
					let name = name.into();
					(name.clone(), Module::new(name))
				})
				.collect(),
		};
		for extension in extensions {
			set.extend(extension.as_ref());
		}
		set
	}

	pub fn get(&self, name: &str) -> Option<&Module> {
		self.modules.get(name)
	}

	pub fn get_mut(&mut self, name: &str) -> Option<&mut Module> {
		self.modules.get_mut(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.modules.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.modules.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.modules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.modules.is_empty()
	}

	/// Applies `extension` to its target module, if registered here.
	pub fn extend(&mut self, extension: &dyn ModuleExtension) {
		if let Some(module) = self.modules.get_mut(extension.module()) {
			module.extend(extension);
		}
	}
}
