use super::ADMIN_LIST_LIMIT;
use crate::{ClientResult, HttpClient};
use reqwest::multipart::{Form, Part};
use shared::models::{
    Category, CategoryCreate, CategoryUpdate, LinkOptionsRequest, OptionGroup, OptionGroupCreate,
    OptionGroupUpdate, OptionValue, OptionValueCreate, OptionValueUpdate, Product, ProductCreate,
    ProductUpdate, UploadedImage,
};

impl HttpClient {
    // ========== Categories ==========

    pub async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        self.get(&format!("/admin/categories/?limit={ADMIN_LIST_LIMIT}"))
            .await
    }

    pub async fn create_category(&self, category: &CategoryCreate) -> ClientResult<Category> {
        self.post("/admin/categories/", category).await
    }

    pub async fn update_category(&self, id: i64, update: &CategoryUpdate) -> ClientResult<Category> {
        self.put(&format!("/admin/categories/{id}"), update).await
    }

    pub async fn delete_category(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/admin/categories/{id}")).await
    }

    // ========== Option groups ==========

    pub async fn list_option_groups(&self) -> ClientResult<Vec<OptionGroup>> {
        self.get(&format!("/admin/options/?limit={ADMIN_LIST_LIMIT}"))
            .await
    }

    pub async fn create_option_group(&self, group: &OptionGroupCreate) -> ClientResult<OptionGroup> {
        self.post("/admin/options/", group).await
    }

    pub async fn update_option_group(
        &self,
        id: i64,
        update: &OptionGroupUpdate,
    ) -> ClientResult<OptionGroup> {
        self.put(&format!("/admin/options/{id}"), update).await
    }

    /// Deleting a group also deletes its values
    pub async fn delete_option_group(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/admin/options/{id}")).await
    }

    // ========== Option values ==========

    pub async fn create_option_value(
        &self,
        option_id: i64,
        value: &OptionValueCreate,
    ) -> ClientResult<OptionValue> {
        self.post(&format!("/admin/options/{option_id}/values"), value)
            .await
    }

    pub async fn update_option_value(
        &self,
        value_id: i64,
        update: &OptionValueUpdate,
    ) -> ClientResult<OptionValue> {
        self.put(&format!("/admin/values/{value_id}"), update).await
    }

    pub async fn delete_option_value(&self, value_id: i64) -> ClientResult<()> {
        self.delete(&format!("/admin/values/{value_id}")).await
    }

    // ========== Products ==========

    pub async fn list_products(&self) -> ClientResult<Vec<Product>> {
        self.get(&format!("/admin/products/?limit={ADMIN_LIST_LIMIT}"))
            .await
    }

    pub async fn create_product(&self, product: &ProductCreate) -> ClientResult<Product> {
        self.post("/admin/products/", product).await
    }

    pub async fn update_product(&self, id: i64, update: &ProductUpdate) -> ClientResult<Product> {
        self.put(&format!("/admin/products/{id}"), update).await
    }

    pub async fn delete_product(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/admin/products/{id}")).await
    }

    /// Replace the option groups linked to a product
    pub async fn link_options(&self, product_id: i64, option_ids: Vec<i64>) -> ClientResult<Product> {
        self.post(
            &format!("/admin/products/{product_id}/link_options"),
            &LinkOptionsRequest { option_ids },
        )
        .await
    }

    // ========== Images ==========

    /// Upload a product image; returns the served path (`/static/...`)
    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<UploadedImage> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);
        let uploaded: UploadedImage = self.post_multipart("/admin/upload-image", form).await?;
        tracing::info!(file_name, image_url = %uploaded.image_url, "Image uploaded");
        Ok(uploaded)
    }
}
