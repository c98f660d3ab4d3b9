use std::collections::HashMap;
use std::sync::Arc;

use zendriver_types::{Command, CommandResponse};

use crate::error::{CdpError, ErrorContext, Result};
use crate::js::RemoteObjectRef;
use crate::tab::TabInner;
use zendriver_cdp::cdp::browser_protocol::dom::{
    BackendNodeId, DescribeNodeParams, GetBoxModelParams, GetOuterHtmlParams, Node, NodeId,
    QuerySelectorAllParams, QuerySelectorParams, RemoveAttributeParams, ResolveNodeParams,
    ScrollIntoViewIfNeededParams, SetAttributeValueParams, SetFileInputFilesParams,
};
use zendriver_cdp::cdp::browser_protocol::dom::FocusParams;
use zendriver_cdp::cdp::browser_protocol::input::{
    DispatchMouseEventParams, InsertTextParams, MouseButton, MouseEventType,
};
use zendriver_cdp::cdp::js_protocol::runtime::{CallArgument, CallFunctionOnParams, RemoteObjectId};

/// A local proxy for a remote
/// [DOM Element](https://developer.mozilla.org/en-US/docs/Web/API/Element).
///
/// The tag name and attribute map are snapshots taken at construction; every
/// action goes over the wire. Operations relying on the remote object id
/// transparently re-resolve it once via the stable `backendNodeId` when it
/// went stale, and fail with [`CdpError::StaleElement`] otherwise.
#[derive(Debug)]
pub struct Element {
    object: RemoteObjectRef,
    pub backend_node_id: BackendNodeId,
    pub node_id: NodeId,
    /// The parent node, when the browser reported one.
    pub parent_id: Option<NodeId>,
    tag_name: String,
    attributes: HashMap<String, String>,
    /// Immediate text children, captured at construction.
    text: String,
    tab: Arc<TabInner>,
}

impl Element {
    pub(crate) async fn new(tab: Arc<TabInner>, node_id: NodeId) -> Result<Self> {
        let node = tab
            .execute(DescribeNodeParams::with_node_id(node_id))
            .await?
            .result
            .node;
        Self::from_node(tab, node).await
    }

    /// Wrap an already described node.
    pub(crate) async fn from_node(tab: Arc<TabInner>, node: Node) -> Result<Self> {
        let resp = tab
            .execute(ResolveNodeParams::with_backend_node_id(
                node.backend_node_id,
            ))
            .await?;
        let object = RemoteObjectRef::new(
            resp.result.object,
            tab.session_id(),
            tab.sender(),
        )
        .ok_or_else(|| CdpError::msg(format!("no object id found for {:?}", node.node_id)))?;

        let attributes = node
            .attribute_pairs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let tag_name = if node.local_name.is_empty() {
            node.node_name.to_ascii_lowercase()
        } else {
            node.local_name.clone()
        };
        // node type 3: text
        let text = node
            .children
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|child| child.node_type == 3)
            .map(|child| child.node_value.as_str())
            .collect::<String>();

        Ok(Self {
            object,
            backend_node_id: node.backend_node_id,
            node_id: node.node_id,
            parent_id: node.parent_id,
            tag_name,
            attributes,
            text,
            tab,
        })
    }

    /// The element's lowercase tag name, captured at construction.
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// The attribute snapshot captured at construction.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// A single attribute from the snapshot.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The remote object id currently backing this element.
    pub fn remote_object_id(&self) -> &RemoteObjectId {
        self.object.object_id()
    }

    /// The element's own text as captured at construction; use [`text`] for
    /// the live value.
    ///
    /// [`text`]: Element::text
    pub fn text_content(&self) -> &str {
        &self.text
    }

    /// Runs a command built from the element's object id, re-resolving the
    /// object exactly once if the browser reports it stale. The only
    /// automatic retry in the crate.
    async fn call<C, F>(&self, make: F) -> Result<CommandResponse<C::Response>>
    where
        C: Command,
        F: Fn(RemoteObjectId) -> C,
    {
        match self.tab.execute(make(self.object.object_id().clone())).await {
            Err(err) if err.is_stale() => {
                let fresh = self.re_resolve().await?;
                self.tab
                    .execute(make(fresh.object_id().clone()))
                    .await
                    .map_err(|err| self.node_error(err))
            }
            other => other,
        }
    }

    async fn re_resolve(&self) -> Result<RemoteObjectRef> {
        let resp = self
            .tab
            .execute(ResolveNodeParams::with_backend_node_id(self.backend_node_id))
            .await
            .map_err(|err| self.node_error(err))?;
        RemoteObjectRef::new(
            resp.result.object,
            self.tab.session_id(),
            self.tab.sender(),
        )
        .ok_or_else(|| CdpError::StaleElement(self.error_context()))
    }

    /// Returns the first descendant matching the given CSS selector.
    pub async fn query(&self, selector: impl Into<String>) -> Result<Element> {
        let selector = selector.into();
        let resp = self
            .tab
            .execute(QuerySelectorParams::new(self.node_id, selector.clone()))
            .await
            .map_err(|err| self.node_error(err))?;
        if resp.result.node_id.inner() == 0 {
            return Err(CdpError::NotFound { selector });
        }
        Element::new(Arc::clone(&self.tab), resp.result.node_id).await
    }

    /// Returns all descendants matching the given CSS selector.
    pub async fn query_all(&self, selector: impl Into<String>) -> Result<Vec<Element>> {
        let resp = self
            .tab
            .execute(QuerySelectorAllParams::new(self.node_id, selector))
            .await
            .map_err(|err| self.node_error(err))?;
        let mut elements = Vec::with_capacity(resp.result.node_ids.len());
        for node_id in resp.result.node_ids {
            elements.push(Element::new(Arc::clone(&self.tab), node_id).await?);
        }
        Ok(elements)
    }

    /// The element's direct children, freshly described.
    pub async fn children(&self) -> Result<Vec<Element>> {
        let resp = self
            .call(|object_id| DescribeNodeParams {
                object_id: Some(object_id),
                depth: Some(1),
                ..Default::default()
            })
            .await?;
        let mut children = Vec::new();
        for node in resp.result.node.children.into_iter().flatten() {
            children.push(Element::from_node(Arc::clone(&self.tab), node).await?);
        }
        Ok(children)
    }

    /// The element's serialized HTML.
    pub async fn outer_html(&self) -> Result<String> {
        let resp = self
            .call(|object_id| GetOuterHtmlParams {
                object_id: Some(object_id),
                ..Default::default()
            })
            .await?;
        Ok(resp.result.outer_html)
    }

    /// The element's text content: its markup stripped of tags.
    pub async fn text(&self) -> Result<String> {
        Ok(strip_tags(&self.outer_html().await?))
    }

    /// Sets an attribute on the remote node.
    pub async fn set_attribute(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&Self> {
        self.tab
            .execute(SetAttributeValueParams::new(self.node_id, name, value))
            .await
            .map_err(|err| self.node_error(err))?;
        Ok(self)
    }

    /// Removes an attribute from the remote node.
    pub async fn remove_attribute(&self, name: impl Into<String>) -> Result<&Self> {
        self.tab
            .execute(RemoveAttributeParams::new(self.node_id, name))
            .await
            .map_err(|err| self.node_error(err))?;
        Ok(self)
    }

    /// The viewport coordinates input events for this element are dispatched
    /// at: the center of its content box.
    pub async fn clickable_point(&self) -> Result<(f64, f64)> {
        let resp = self
            .call(|object_id| GetBoxModelParams::with_object_id(object_id))
            .await
            .map_err(|err| match err {
                CdpError::Chrome(ref chrome)
                    if chrome.message.to_ascii_lowercase().contains("box model") =>
                {
                    CdpError::ElementNotInteractable("no box model".to_string())
                }
                other => other,
            })?;
        resp.result
            .model
            .content_center()
            .ok_or_else(|| CdpError::ElementNotInteractable("empty box model".to_string()))
    }

    /// Scrolls the element into view and clicks its center.
    pub async fn click(&self) -> Result<&Self> {
        self.scroll_into_view().await?;
        let (x, y) = self.clickable_point().await?;
        self.tab
            .execute(
                DispatchMouseEventParams::new(MouseEventType::MousePressed, x, y)
                    .button(MouseButton::Left)
                    .click_count(1),
            )
            .await?;
        self.tab
            .execute(
                DispatchMouseEventParams::new(MouseEventType::MouseReleased, x, y)
                    .button(MouseButton::Left)
                    .click_count(1),
            )
            .await?;
        Ok(self)
    }

    /// Scrolls the element into view if it is not already visible.
    pub async fn scroll_into_view(&self) -> Result<&Self> {
        self.call(|object_id| ScrollIntoViewIfNeededParams::with_object_id(object_id))
            .await?;
        Ok(self)
    }

    /// Focuses the element.
    pub async fn focus(&self) -> Result<&Self> {
        self.call(|object_id| FocusParams::with_object_id(object_id))
            .await?;
        Ok(self)
    }

    /// Removes focus from the element.
    pub async fn blur(&self) -> Result<&Self> {
        self.call(|object_id| {
            CallFunctionOnParams::new("function() { this.blur(); }").object_id(object_id)
        })
        .await?;
        Ok(self)
    }

    /// Focuses the element and types the text as individual key strokes, in
    /// order.
    pub async fn type_text(&self, text: &str) -> Result<&Self> {
        self.focus().await?;
        for c in text.chars() {
            for event in crate::keys::for_char(c).events() {
                self.tab.execute(event).await?;
            }
        }
        Ok(self)
    }

    /// Focuses the element and inserts the text at once, the way an IME
    /// would.
    pub async fn insert_text(&self, text: impl Into<String>) -> Result<&Self> {
        self.focus().await?;
        self.tab.execute(InsertTextParams::new(text)).await?;
        Ok(self)
    }

    /// Selects the option with the given value on a `<select>` element and
    /// fires the usual input/change events.
    pub async fn select_option(&self, value: impl Into<String>) -> Result<&Self> {
        let mut params = CallFunctionOnParams::new(
            "function(value) { \
                this.value = value; \
                this.dispatchEvent(new Event('input', { bubbles: true })); \
                this.dispatchEvent(new Event('change', { bubbles: true })); \
            }",
        );
        params.arguments = Some(vec![CallArgument {
            value: Some(serde_json::Value::String(value.into())),
            object_id: None,
        }]);
        self.call(|object_id| params.clone().object_id(object_id))
            .await?;
        Ok(self)
    }

    /// Sets the files of a file input element.
    pub async fn upload_file(&self, files: Vec<String>) -> Result<&Self> {
        let mut params = SetFileInputFilesParams::new(files);
        params.backend_node_id = Some(self.backend_node_id);
        self.tab.execute(params).await.map_err(|err| self.node_error(err))?;
        Ok(self)
    }

    /// Node-id scoped commands get no automatic retry; a stale node is final.
    fn node_error(&self, err: CdpError) -> CdpError {
        if err.is_stale() {
            CdpError::StaleElement(self.error_context())
        } else {
            err
        }
    }

    fn error_context(&self) -> ErrorContext {
        ErrorContext::for_target(self.tab.target_id().clone())
    }
}


/// Strips markup from serialized HTML and decodes the basic entities.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    let out = out
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tags_removes_markup() {
        assert_eq!(
            strip_tags("<button id=\"b\">Click &amp; go</button>"),
            "Click & go"
        );
        assert_eq!(strip_tags("<div><p>a</p><p>b</p></div>"), "ab");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn strip_tags_decodes_entities_last() {
        // the entity must not be re-interpreted as markup
        assert_eq!(strip_tags("<span>&lt;b&gt;</span>"), "<b>");
    }
}
