//! HTTP implementation of [`GameApi`] using `reqwest`.

use serde::Serialize;
use serde::de::DeserializeOwned;

use usurper_protocol::{
    Ack, ActionRequest, ActionResponse, CreateRoomResponse, PlayerId,
    RoomCode, StateResponse,
};

use crate::{GameApi, TransportError};

/// The authority's error body: `{"detail": "..."}`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// A [`GameApi`] over the authority's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base: String,
    http: reqwest::Client,
}

impl HttpApi {
    /// Creates a client for the service at `base`,
    /// e.g. `http://localhost:8000`.
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    /// The base URL this client talks to.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    /// Maps a non-success status to [`TransportError::Rejected`] carrying
    /// the authority's verbatim detail string.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or(text);
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[derive(Serialize)]
struct CreateBody<'a> {
    host_id: &'a PlayerId,
}

#[derive(Serialize)]
struct JoinBody<'a> {
    room_code: &'a RoomCode,
    player_id: &'a PlayerId,
    nickname: &'a str,
}

#[derive(Serialize)]
struct RoomBody<'a> {
    room_code: &'a RoomCode,
}

#[derive(Serialize)]
struct MemberBody<'a> {
    room_code: &'a RoomCode,
    player_id: &'a PlayerId,
}

#[derive(Serialize)]
struct ActionBody<'a> {
    room_code: &'a RoomCode,
    player_id: &'a PlayerId,
    #[serde(flatten)]
    request: &'a ActionRequest,
}

impl GameApi for HttpApi {
    async fn create_room(
        &self,
        host: &PlayerId,
    ) -> Result<CreateRoomResponse, TransportError> {
        self.post("/api/game/create", &CreateBody { host_id: host })
            .await
    }

    async fn join_room(
        &self,
        room: &RoomCode,
        player: &PlayerId,
        nickname: &str,
    ) -> Result<Ack, TransportError> {
        self.post(
            "/api/game/join",
            &JoinBody {
                room_code: room,
                player_id: player,
                nickname,
            },
        )
        .await
    }

    async fn start_room(&self, room: &RoomCode) -> Result<Ack, TransportError> {
        self.post("/api/game/start", &RoomBody { room_code: room })
            .await
    }

    async fn submit_action(
        &self,
        room: &RoomCode,
        player: &PlayerId,
        request: &ActionRequest,
    ) -> Result<ActionResponse, TransportError> {
        self.post(
            "/api/game/action",
            &ActionBody {
                room_code: room,
                player_id: player,
                request,
            },
        )
        .await
    }

    async fn fetch_state(
        &self,
        room: &RoomCode,
        viewer: &PlayerId,
    ) -> Result<StateResponse, TransportError> {
        let response = self
            .http
            .get(self.url("/api/game/state"))
            .query(&[
                ("room_code", room.0.as_str()),
                ("viewer_id", viewer.0.as_str()),
            ])
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn leave_room(
        &self,
        room: &RoomCode,
        player: &PlayerId,
    ) -> Result<Ack, TransportError> {
        self.post(
            "/api/game/leave",
            &MemberBody {
                room_code: room,
                player_id: player,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpApi::new("http://localhost:8000///");
        assert_eq!(api.base(), "http://localhost:8000");
        assert_eq!(api.url("/api/game/state"), "http://localhost:8000/api/game/state");
    }

    #[test]
    fn test_action_body_flattens_request() {
        let body = ActionBody {
            room_code: &RoomCode::from("ab12"),
            player_id: &PlayerId::from("g-1"),
            request: &ActionRequest::select_card(0),
        };
        let json: serde_json::Value = serde_json::to_value(&body).unwrap();
        assert_eq!(json["room_code"], "ab12");
        assert_eq!(json["player_id"], "g-1");
        assert_eq!(json["action_type"], "select_card");
        assert_eq!(json["card_index"], 0);
    }
}
