use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::error::RecipeClientError;
use crate::token::TokenStore;
use crate::types::{
    AccessToken, Attribute, AttributeKind, NewRecipe, ProfileUpdate, Recipe, RecipeDetail,
    RecipeImage, RecipeUpdate, TokenPair, User,
};

#[derive(Debug, Clone)]
pub struct RecipeClientHttp {
    client: Client,
    base_url: String,
    store: TokenStore,
    tokens: Option<TokenPair>,
}

impl RecipeClientHttp {
    /// Builds a client for `endpoint`, picking up any token pair saved in `store`.
    pub fn connect(endpoint: &str, store: TokenStore) -> Result<Self, RecipeClientError> {
        let base_url = endpoint.trim_end_matches('/').to_string();
        let tokens = store.load()?;
        Ok(Self {
            client: Client::builder().build()?,
            base_url,
            store,
            tokens,
        })
    }

    pub fn tokens(&self) -> Option<&TokenPair> {
        self.tokens.as_ref()
    }

    fn set_tokens(&mut self, tokens: TokenPair) -> Result<(), RecipeClientError> {
        self.store.save(&tokens)?;
        self.tokens = Some(tokens);
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, RecipeClientError> {
        let tokens = self.tokens.as_ref().ok_or(RecipeClientError::NotLoggedIn)?;
        Ok(req.bearer_auth(&tokens.access))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, RecipeClientError> {
        let resp = req.send().await?;
        debug!(status = %resp.status(), url = %resp.url(), "response received");
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(RecipeClientError::from_http_response(resp).await)
        }
    }

    async fn send_empty(&self, req: RequestBuilder) -> Result<(), RecipeClientError> {
        let resp = req.send().await?;
        debug!(status = %resp.status(), url = %resp.url(), "response received");
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(RecipeClientError::from_http_response(resp).await)
        }
    }

    // ======================= USERS =======================

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, RecipeClientError> {
        let req = self.client.post(self.url("/user/create")).json(&json!({
            "email": email,
            "password": password,
            "name": name,
        }));
        self.send(req).await
    }

    /// Obtains a token pair and saves it to the token file.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), RecipeClientError> {
        let req = self.client.post(self.url("/user/token")).json(&json!({
            "email": email,
            "password": password,
        }));
        let tokens: TokenPair = self.send(req).await?;
        self.set_tokens(tokens)
    }

    /// Trades the saved refresh token for a new access token.
    pub async fn refresh(&mut self) -> Result<(), RecipeClientError> {
        let refresh = self
            .tokens
            .as_ref()
            .map(|t| t.refresh.clone())
            .ok_or(RecipeClientError::NotLoggedIn)?;
        let req = self
            .client
            .post(self.url("/user/token/refresh"))
            .json(&json!({ "refresh": refresh }));
        let fresh: AccessToken = self.send(req).await?;
        self.set_tokens(TokenPair {
            access: fresh.access,
            refresh,
        })
    }

    pub fn logout(&mut self) -> Result<(), RecipeClientError> {
        self.tokens = None;
        self.store.clear()
    }

    pub async fn me(&self) -> Result<User, RecipeClientError> {
        let req = self.authorized(self.client.get(self.url("/user/me")))?;
        self.send(req).await
    }

    pub async fn update_me(&self, changes: &ProfileUpdate) -> Result<User, RecipeClientError> {
        let req = self.authorized(self.client.patch(self.url("/user/me")))?;
        self.send(req.json(changes)).await
    }

    // ======================= TAGS / INGREDIENTS =======================

    fn attribute_url(&self, kind: AttributeKind, id: Option<Uuid>) -> String {
        match id {
            Some(id) => self.url(&format!("/recipe/{}/{}", kind.path(), id)),
            None => self.url(&format!("/recipe/{}", kind.path())),
        }
    }

    pub async fn list_attributes(
        &self,
        kind: AttributeKind,
    ) -> Result<Vec<Attribute>, RecipeClientError> {
        let req = self.authorized(self.client.get(self.attribute_url(kind, None)))?;
        self.send(req).await
    }

    pub async fn create_attribute(
        &self,
        kind: AttributeKind,
        name: &str,
    ) -> Result<Attribute, RecipeClientError> {
        let req = self.authorized(self.client.post(self.attribute_url(kind, None)))?;
        self.send(req.json(&json!({ "name": name }))).await
    }

    pub async fn rename_attribute(
        &self,
        kind: AttributeKind,
        id: Uuid,
        name: &str,
    ) -> Result<Attribute, RecipeClientError> {
        let req = self.authorized(self.client.patch(self.attribute_url(kind, Some(id))))?;
        self.send(req.json(&json!({ "name": name }))).await
    }

    pub async fn delete_attribute(
        &self,
        kind: AttributeKind,
        id: Uuid,
    ) -> Result<(), RecipeClientError> {
        let req = self.authorized(self.client.delete(self.attribute_url(kind, Some(id))))?;
        self.send_empty(req).await
    }

    // ======================= RECIPES =======================

    fn recipe_url(&self, id: Option<Uuid>) -> String {
        match id {
            Some(id) => self.url(&format!("/recipe/recipes/{}", id)),
            None => self.url("/recipe/recipes"),
        }
    }

    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, RecipeClientError> {
        let req = self.authorized(self.client.get(self.recipe_url(None)))?;
        self.send(req).await
    }

    pub async fn get_recipe(&self, id: Uuid) -> Result<RecipeDetail, RecipeClientError> {
        let req = self.authorized(self.client.get(self.recipe_url(Some(id))))?;
        self.send(req).await
    }

    pub async fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, RecipeClientError> {
        let req = self.authorized(self.client.post(self.recipe_url(None)))?;
        self.send(req.json(recipe)).await
    }

    /// Full replacement; tags and ingredients not listed are unlinked.
    pub async fn replace_recipe(
        &self,
        id: Uuid,
        recipe: &NewRecipe,
    ) -> Result<Recipe, RecipeClientError> {
        let req = self.authorized(self.client.put(self.recipe_url(Some(id))))?;
        self.send(req.json(recipe)).await
    }

    pub async fn update_recipe(
        &self,
        id: Uuid,
        changes: &RecipeUpdate,
    ) -> Result<Recipe, RecipeClientError> {
        let req = self.authorized(self.client.patch(self.recipe_url(Some(id))))?;
        self.send(req.json(changes)).await
    }

    pub async fn delete_recipe(&self, id: Uuid) -> Result<(), RecipeClientError> {
        let req = self.authorized(self.client.delete(self.recipe_url(Some(id))))?;
        self.send_empty(req).await
    }

    pub async fn upload_image(
        &self,
        id: Uuid,
        file: &Path,
    ) -> Result<RecipeImage, RecipeClientError> {
        let bytes = std::fs::read(file)?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let form = Form::new().part("image", Part::bytes(bytes).file_name(file_name));

        let url = format!("{}/upload-image", self.recipe_url(Some(id)));
        let req = self.authorized(self.client.post(url))?;
        self.send(req.multipart(form)).await
    }
}
