//! Built-in introspection calls.

use std::collections::BTreeMap;

use crm_protocol::{
	AvailableModules, FieldInfo, ModuleFields, ModuleFieldsParams, ServerInfo, SessionParams, methods,
};
use crm_runtime::{Error, Result};
use serde_json::{Map, Value};

use super::Session;

impl Session {
	/// Server flavor, version and clock (`get_server_info`).
	pub async fn server_info(&self) -> Result<ServerInfo> {
		self.call(methods::GET_SERVER_INFO, &Map::<String, Value>::new())
			.await?
			.ok_or_else(|| Error::EmptyResponse {
				method: methods::GET_SERVER_INFO.to_string(),
			})
	}

	pub async fn server_version(&self) -> Result<String> {
		Ok(self.server_info().await?.version)
	}

	/// Id of the logged-in user as reported by `get_user_id`.
	pub async fn current_user_id(&self) -> Result<String> {
		let token = self.token().await?;
		match self.send(methods::GET_USER_ID, &SessionParams::new(token)).await? {
			Some(Value::String(id)) => Ok(id),
			Some(Value::Number(id)) => Ok(id.to_string()),
			_ => Err(Error::EmptyResponse {
				method: methods::GET_USER_ID.to_string(),
			}),
		}
	}

	/// Names of the modules the logged-in user may access.
	pub async fn available_modules(&self) -> Result<Vec<String>> {
		let token = self.token().await?;
		let modules: Option<AvailableModules> = self
			.call(methods::GET_AVAILABLE_MODULES, &SessionParams::new(token))
			.await?;
		Ok(modules.map(|m| m.names()).unwrap_or_default())
	}

	/// Field descriptions of `module`, cached on this namespace's definition.
	pub async fn module_fields(&self, module: &str) -> Result<BTreeMap<String, FieldInfo>> {
		if let Some(fields) = self.module(module).and_then(|m| m.fields().cloned()) {
			return Ok(fields);
		}

		let params = ModuleFieldsParams {
			session: self.token().await?,
			module_name: module.to_string(),
		};
		let fields = self
			.call::<_, ModuleFields>(methods::GET_MODULE_FIELDS, &params)
			.await?
			.map(|f| f.fields())
			.unwrap_or_default();
		self.cache_fields(module, &fields);
		Ok(fields)
	}
}
