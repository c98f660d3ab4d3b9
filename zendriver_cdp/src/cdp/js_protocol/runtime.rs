//! Runtime domain exposes JavaScript runtime by means of remote evaluation
//! and mirror objects.
//! [Runtime](https://chromedevtools.github.io/devtools-protocol/tot/Runtime/)

use serde::{Deserialize, Serialize};

use crate::cdp::{cdp_command, cdp_event, cdp_string_id};

cdp_string_id!(
    /// Unique object identifier.
    RemoteObjectId
);
cdp_string_id!(
    /// Unique script identifier.
    ScriptId
);

/// Id of an execution context.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ExecutionContextId(i64);

impl ExecutionContextId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn inner(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ExecutionContextId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Mirror object referencing original JavaScript object.
/// [RemoteObject](https://chromedevtools.github.io/devtools-protocol/tot/Runtime/#type-RemoteObject)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object type: `object`, `function`, `undefined`, `string`, `number`,
    /// `boolean`, `symbol`, `bigint`.
    pub r#type: String,
    /// Object subtype hint. Specified for `object` type values only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Object class (constructor) name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Remote object value in case of primitive values or JSON values (if it
    /// was requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// String representation of the object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unique object identifier (for non-primitive values).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
}

/// Detailed information about exception (or error) that was thrown during
/// script compilation or execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    pub exception_id: i64,
    /// Exception text, which should be used together with exception object
    /// when available.
    pub text: String,
    pub line_number: i64,
    pub column_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_id: Option<ScriptId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Exception object if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<RemoteObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_context_id: Option<ExecutionContextId>,
}

/// Description of an isolated world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContextDescription {
    pub id: ExecutionContextId,
    /// Execution context origin.
    pub origin: String,
    /// Human readable name describing given context.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux_data: Option<serde_json::Value>,
}

/// [enable](https://chromedevtools.github.io/devtools-protocol/tot/Runtime/#method-enable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnableParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnableReturns {}

cdp_command!(EnableParams, "Runtime.enable", EnableReturns);

/// [disable](https://chromedevtools.github.io/devtools-protocol/tot/Runtime/#method-disable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisableParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisableReturns {}

cdp_command!(DisableParams, "Runtime.disable", DisableReturns);

/// Evaluates expression on global object.
/// [evaluate](https://chromedevtools.github.io/devtools-protocol/tot/Runtime/#method-evaluate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    /// Expression to evaluate.
    pub expression: String,
    /// Whether the result is expected to be a JSON object that should be sent
    /// by value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
    /// Determines whether Command Line API should be available during the
    /// evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_command_line_api: Option<bool>,
    /// In silent mode exceptions thrown during evaluation are not reported and
    /// do not pause execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
    /// Whether execution should `await` for resulting value and return once
    /// awaited promise is resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<ExecutionContextId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_gesture: Option<bool>,
}

impl EvaluateParams {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            return_by_value: None,
            include_command_line_api: None,
            silent: None,
            await_promise: None,
            context_id: None,
            user_gesture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateReturns {
    /// Evaluation result.
    pub result: RemoteObject,
    /// Exception details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_details: Option<ExceptionDetails>,
}

cdp_command!(EvaluateParams, "Runtime.evaluate", EvaluateReturns);

/// Calls function with given declaration on the given object.
/// [callFunctionOn](https://chromedevtools.github.io/devtools-protocol/tot/Runtime/#method-callFunctionOn)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnParams {
    /// Declaration of the function to call.
    pub function_declaration: String,
    /// Identifier of the object to call function on. Either objectId or
    /// executionContextId should be specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
    /// Call arguments. All call arguments must belong to the same JavaScript
    /// world as the target object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<CallArgument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_context_id: Option<ExecutionContextId>,
}

impl CallFunctionOnParams {
    pub fn new(function_declaration: impl Into<String>) -> Self {
        Self {
            function_declaration: function_declaration.into(),
            object_id: None,
            arguments: None,
            silent: None,
            return_by_value: None,
            await_promise: None,
            execution_context_id: None,
        }
    }

    pub fn object_id(mut self, object_id: impl Into<RemoteObjectId>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }
}

/// Represents function call argument.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnReturns {
    /// Call result.
    pub result: RemoteObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_details: Option<ExceptionDetails>,
}

cdp_command!(
    CallFunctionOnParams,
    "Runtime.callFunctionOn",
    CallFunctionOnReturns
);

/// Releases remote object with given id.
/// [releaseObject](https://chromedevtools.github.io/devtools-protocol/tot/Runtime/#method-releaseObject)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseObjectParams {
    pub object_id: RemoteObjectId,
}

impl ReleaseObjectParams {
    pub fn new(object_id: impl Into<RemoteObjectId>) -> Self {
        Self {
            object_id: object_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReleaseObjectReturns {}

cdp_command!(
    ReleaseObjectParams,
    "Runtime.releaseObject",
    ReleaseObjectReturns
);

/// Issued when new execution context is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventExecutionContextCreated {
    /// A newly created execution context.
    pub context: ExecutionContextDescription,
}

cdp_event!(EventExecutionContextCreated, "Runtime.executionContextCreated");

/// Issued when execution context is destroyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventExecutionContextDestroyed {
    pub execution_context_id: ExecutionContextId,
}

cdp_event!(
    EventExecutionContextDestroyed,
    "Runtime.executionContextDestroyed"
);

/// Issued when all executionContexts were cleared in browser.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventExecutionContextsCleared {}

cdp_event!(
    EventExecutionContextsCleared,
    "Runtime.executionContextsCleared"
);
