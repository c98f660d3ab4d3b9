//! DOM interaction is implemented in terms of mirror objects that represent
//! the actual DOM nodes.
//! [DOM](https://chromedevtools.github.io/devtools-protocol/tot/DOM/)

use serde::{Deserialize, Serialize};

use crate::cdp::browser_protocol::page::FrameId;
use crate::cdp::cdp_command;
use crate::cdp::js_protocol::runtime::{RemoteObject, RemoteObjectId};

/// Unique DOM node identifier. Only valid while the frontend holds the
/// document; reset on every `DOM.getDocument`.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Unique DOM node identifier used to reference a node that may not have been
/// pushed to the front-end. Stable across `DOM.enable` cycles within a
/// document.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct BackendNodeId(u32);

impl BackendNodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl From<u32> for BackendNodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Backend node with a friendly name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendNode {
    pub node_type: i64,
    pub node_name: String,
    pub backend_node_id: BackendNodeId,
}

/// DOMNode is a base node mirror type.
/// [Node](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#type-Node)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node identifier that is passed into the rest of the DOM messages as the
    /// `nodeId`.
    pub node_id: NodeId,
    /// The id of the parent node if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// The BackendNodeId for this node.
    pub backend_node_id: BackendNodeId,
    /// `Node`'s nodeType.
    pub node_type: i64,
    /// `Node`'s nodeName.
    pub node_name: String,
    /// `Node`'s localName.
    pub local_name: String,
    /// `Node`'s nodeValue.
    pub node_value: String,
    /// Child count for `Container` nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_node_count: Option<u32>,
    /// Child nodes of this node when requested with children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
    /// Attributes of the `Element` node in the form of flat array
    /// `[name1, value1, name2, value2]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
    /// Document URL that `Document` or `FrameOwner` node points to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    /// Base URL that `Document` or `FrameOwner` node uses for URL completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Frame ID for frame owner elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<FrameId>,
    /// Content document for frame owner elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_document: Option<Box<Node>>,
    /// Whether the node is SVG.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_svg: Option<bool>,
}

impl Node {
    /// The attribute flat array as name → value pairs.
    pub fn attribute_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.attributes
            .as_deref()
            .unwrap_or_default()
            .chunks_exact(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }
}

/// Box model.
/// [BoxModel](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#type-BoxModel)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxModel {
    /// Content box: quad of [x1, y1, x2, y2, x3, y3, x4, y4].
    pub content: Vec<f64>,
    pub padding: Vec<f64>,
    pub border: Vec<f64>,
    pub margin: Vec<f64>,
    /// Node width.
    pub width: i64,
    /// Node height.
    pub height: i64,
}

impl BoxModel {
    /// Geometric center of the content quad, the point input events are
    /// dispatched at.
    pub fn content_center(&self) -> Option<(f64, f64)> {
        if self.content.len() < 8 {
            return None;
        }
        let xs = [self.content[0], self.content[2], self.content[4], self.content[6]];
        let ys = [self.content[1], self.content[3], self.content[5], self.content[7]];
        Some((
            xs.iter().sum::<f64>() / 4.0,
            ys.iter().sum::<f64>() / 4.0,
        ))
    }
}

/// [enable](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-enable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnableParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnableReturns {}

cdp_command!(EnableParams, "DOM.enable", EnableReturns);

/// [disable](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-disable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisableParams {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisableReturns {}

cdp_command!(DisableParams, "DOM.disable", DisableReturns);

/// Returns the root DOM node (and optionally the subtree) to the caller.
/// [getDocument](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-getDocument)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentParams {
    /// The maximum depth at which children should be retrieved, defaults to 1.
    /// Use -1 for the entire subtree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<i64>,
    /// Whether or not iframes and shadow roots should be traversed when
    /// returning the subtree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pierce: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDocumentReturns {
    /// Resulting node.
    pub root: Node,
}

cdp_command!(GetDocumentParams, "DOM.getDocument", GetDocumentReturns);

/// Executes `querySelector` on a given node.
/// [querySelector](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-querySelector)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorParams {
    pub node_id: NodeId,
    pub selector: String,
}

impl QuerySelectorParams {
    pub fn new(node_id: NodeId, selector: impl Into<String>) -> Self {
        Self {
            node_id,
            selector: selector.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorReturns {
    /// Query selector result. Zero when nothing matched.
    pub node_id: NodeId,
}

cdp_command!(QuerySelectorParams, "DOM.querySelector", QuerySelectorReturns);

/// Executes `querySelectorAll` on a given node.
/// [querySelectorAll](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-querySelectorAll)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorAllParams {
    pub node_id: NodeId,
    pub selector: String,
}

impl QuerySelectorAllParams {
    pub fn new(node_id: NodeId, selector: impl Into<String>) -> Self {
        Self {
            node_id,
            selector: selector.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySelectorAllReturns {
    /// Query selector result.
    pub node_ids: Vec<NodeId>,
}

cdp_command!(
    QuerySelectorAllParams,
    "DOM.querySelectorAll",
    QuerySelectorAllReturns
);

/// Describes node given its id, does not require domain to be enabled.
/// [describeNode](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-describeNode)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeNodeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
    /// The maximum depth at which children should be retrieved, defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pierce: Option<bool>,
}

impl DescribeNodeParams {
    pub fn with_node_id(node_id: NodeId) -> Self {
        Self {
            node_id: Some(node_id),
            ..Default::default()
        }
    }

    pub fn with_backend_node_id(backend_node_id: BackendNodeId) -> Self {
        Self {
            backend_node_id: Some(backend_node_id),
            ..Default::default()
        }
    }

    pub fn depth(mut self, depth: i64) -> Self {
        self.depth = Some(depth);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeNodeReturns {
    /// Node description.
    pub node: Node,
}

cdp_command!(DescribeNodeParams, "DOM.describeNode", DescribeNodeReturns);

/// Resolves the JavaScript node object for a given NodeId or BackendNodeId.
/// [resolveNode](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-resolveNode)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveNodeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
}

impl ResolveNodeParams {
    pub fn with_backend_node_id(backend_node_id: BackendNodeId) -> Self {
        Self {
            backend_node_id: Some(backend_node_id),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveNodeReturns {
    /// JavaScript object wrapper for given node.
    pub object: RemoteObject,
}

cdp_command!(ResolveNodeParams, "DOM.resolveNode", ResolveNodeReturns);

/// Requests that the node is sent to the caller given the JavaScript node
/// object reference.
/// [requestNode](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-requestNode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestNodeParams {
    pub object_id: RemoteObjectId,
}

impl RequestNodeParams {
    pub fn new(object_id: impl Into<RemoteObjectId>) -> Self {
        Self {
            object_id: object_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestNodeReturns {
    pub node_id: NodeId,
}

cdp_command!(RequestNodeParams, "DOM.requestNode", RequestNodeReturns);

/// [getBoxModel](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-getBoxModel)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBoxModelParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
}

impl GetBoxModelParams {
    pub fn with_object_id(object_id: impl Into<RemoteObjectId>) -> Self {
        Self {
            object_id: Some(object_id.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBoxModelReturns {
    pub model: BoxModel,
}

cdp_command!(GetBoxModelParams, "DOM.getBoxModel", GetBoxModelReturns);

/// Scrolls the specified node into view if not already visible.
/// [scrollIntoViewIfNeeded](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-scrollIntoViewIfNeeded)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollIntoViewIfNeededParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
}

impl ScrollIntoViewIfNeededParams {
    pub fn with_object_id(object_id: impl Into<RemoteObjectId>) -> Self {
        Self {
            object_id: Some(object_id.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollIntoViewIfNeededReturns {}

cdp_command!(
    ScrollIntoViewIfNeededParams,
    "DOM.scrollIntoViewIfNeeded",
    ScrollIntoViewIfNeededReturns
);

/// Returns node's HTML markup.
/// [getOuterHTML](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-getOuterHTML)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOuterHtmlParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
}

impl GetOuterHtmlParams {
    pub fn with_backend_node_id(backend_node_id: BackendNodeId) -> Self {
        Self {
            backend_node_id: Some(backend_node_id),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOuterHtmlReturns {
    /// Outer HTML markup.
    pub outer_html: String,
}

cdp_command!(GetOuterHtmlParams, "DOM.getOuterHTML", GetOuterHtmlReturns);

/// Returns attributes for the specified node.
/// [getAttributes](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-getAttributes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAttributesParams {
    pub node_id: NodeId,
}

impl GetAttributesParams {
    pub fn new(node_id: NodeId) -> Self {
        Self { node_id }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAttributesReturns {
    /// An interleaved array of node attribute names and values.
    pub attributes: Vec<String>,
}

cdp_command!(GetAttributesParams, "DOM.getAttributes", GetAttributesReturns);

/// Sets attribute for an element with given id.
/// [setAttributeValue](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-setAttributeValue)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAttributeValueParams {
    pub node_id: NodeId,
    pub name: String,
    pub value: String,
}

impl SetAttributeValueParams {
    pub fn new(node_id: NodeId, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            node_id,
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetAttributeValueReturns {}

cdp_command!(
    SetAttributeValueParams,
    "DOM.setAttributeValue",
    SetAttributeValueReturns
);

/// Removes attribute with given name from an element with given id.
/// [removeAttribute](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-removeAttribute)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAttributeParams {
    pub node_id: NodeId,
    pub name: String,
}

impl RemoveAttributeParams {
    pub fn new(node_id: NodeId, name: impl Into<String>) -> Self {
        Self {
            node_id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoveAttributeReturns {}

cdp_command!(
    RemoveAttributeParams,
    "DOM.removeAttribute",
    RemoveAttributeReturns
);

/// Sets files for the given file input element.
/// [setFileInputFiles](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-setFileInputFiles)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFileInputFilesParams {
    /// Array of file paths to set.
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
}

impl SetFileInputFilesParams {
    pub fn new(files: Vec<String>) -> Self {
        Self {
            files,
            node_id: None,
            backend_node_id: None,
            object_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetFileInputFilesReturns {}

cdp_command!(
    SetFileInputFilesParams,
    "DOM.setFileInputFiles",
    SetFileInputFilesReturns
);

/// Focuses the given element.
/// [focus](https://chromedevtools.github.io/devtools-protocol/tot/DOM/#method-focus)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_node_id: Option<BackendNodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
}

impl FocusParams {
    pub fn with_object_id(object_id: impl Into<RemoteObjectId>) -> Self {
        Self {
            object_id: Some(object_id.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FocusReturns {}

cdp_command!(FocusParams, "DOM.focus", FocusReturns);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_attribute_pairs() {
        let node: Node = serde_json::from_value(serde_json::json!({
            "nodeId": 4,
            "backendNodeId": 9,
            "nodeType": 1,
            "nodeName": "BUTTON",
            "localName": "button",
            "nodeValue": "",
            "attributes": ["id", "b", "onclick", "window.__c=1"]
        }))
        .unwrap();
        let attrs: Vec<_> = node.attribute_pairs().collect();
        assert_eq!(attrs, vec![("id", "b"), ("onclick", "window.__c=1")]);
    }

    #[test]
    fn box_model_center() {
        let model = BoxModel {
            content: vec![0.0, 0.0, 10.0, 0.0, 10.0, 20.0, 0.0, 20.0],
            padding: vec![],
            border: vec![],
            margin: vec![],
            width: 10,
            height: 20,
        };
        assert_eq!(model.content_center(), Some((5.0, 10.0)));
    }
}
