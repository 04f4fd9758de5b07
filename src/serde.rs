use serde_json::Value;

pub trait SerdeResponseParse {
    type Error;

    fn serde_parse_custom<T>(self) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

impl SerdeResponseParse for Value {
    type Error = crate::Error;

    fn serde_parse_custom<T>(self) -> Result<T, crate::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        (&self).serde_parse_custom()
    }
}

impl SerdeResponseParse for &Value {
    type Error = crate::Error;

    fn serde_parse_custom<T>(self) -> Result<T, crate::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        if let Ok(s) = serde_json::to_string(&self) {
            Ok(serde_path_to_error::deserialize(
                &mut serde_json::Deserializer::from_str(&s),
            )?)
        } else {
            serde_json::from_value(self.clone())
                .map_err(|e| crate::Error::SerdeJsonValueParseFailed(self.clone(), e))
        }
    }
}

pub trait SerdeResponseParseAsync {
    type Error;

    fn serde_parse_custom<T>(
        self,
    ) -> impl std::future::Future<Output = Result<T, Self::Error>> + Send
    where
        T: serde::de::DeserializeOwned;
}

impl SerdeResponseParseAsync for reqwest::Response {
    type Error = crate::Error;

    async fn serde_parse_custom<T>(self) -> Result<T, crate::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let text = self.text().await?;
        Ok(serde_path_to_error::deserialize(
            &mut serde_json::Deserializer::from_str(&text),
        )?)
    }
}
