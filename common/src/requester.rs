//! 解析リクエスタ（クライアント側の状態管理）
//!
//! 撮影/アップロード/テキスト入力 → 解析中 → 結果 or エラー の遷移を管理する。
//! 解析は同時に1件のみ。解析中の新しいトリガーはキューせず拒否する。
//!
//! カメラのストリームは撮影・キャンセル・エラー・リセット・破棄の
//! どの経路でも必ず1回だけ停止される。

use crate::error::Error;
use crate::types::{AnalysisInput, WasteAnalysis};

/// 開いているカメラストリーム
pub trait MediaStream {
    /// ストリームを停止しデバイスを解放する
    fn stop(&mut self);
}

/// カメラデバイス
pub trait CaptureDevice {
    type Stream: MediaStream;

    fn open(&mut self) -> Result<Self::Stream, CaptureError>;

    /// 現在のフレームをJPEGのData URLとして取得
    fn snapshot(&mut self, stream: &mut Self::Stream) -> Result<String, CaptureError>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    #[error("could not read frame: {0}")]
    Frame(String),
}

#[derive(thiserror::Error, Debug)]
pub enum RequesterError {
    #[error("an analysis is already in progress")]
    Busy,

    #[error("camera is not active")]
    NotCapturing,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Input(#[from] Error),
}

/// 表示状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequesterState {
    Idle,
    LiveCapture,
    Analyzing,
    Done(WasteAnalysis),
    Failed(String),
}

/// カメラを持たない環境用のデバイス
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCamera;

/// `NoCamera` のストリーム（生成されない）
#[derive(Debug)]
pub enum NoStream {}

impl MediaStream for NoStream {
    fn stop(&mut self) {
        match *self {}
    }
}

impl CaptureDevice for NoCamera {
    type Stream = NoStream;

    fn open(&mut self) -> Result<NoStream, CaptureError> {
        Err(CaptureError::Unavailable("no camera on this device".into()))
    }

    fn snapshot(&mut self, stream: &mut NoStream) -> Result<String, CaptureError> {
        match *stream {}
    }
}

pub struct AnalysisRequester<D: CaptureDevice> {
    device: D,
    stream: Option<D::Stream>,
    state: RequesterState,
    selected_image: Option<String>,
}

impl<D: CaptureDevice> AnalysisRequester<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            stream: None,
            state: RequesterState::Idle,
            selected_image: None,
        }
    }

    pub fn state(&self) -> &RequesterState {
        &self.state
    }

    /// 選択/撮影された画像（プレビュー用Data URL）
    pub fn selected_image(&self) -> Option<&str> {
        self.selected_image.as_deref()
    }

    /// 新しい解析を開始できるか（解析中はトリガー無効）
    pub fn can_trigger(&self) -> bool {
        !matches!(self.state, RequesterState::Analyzing)
    }

    pub fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    pub fn start_camera(&mut self) -> Result<(), RequesterError> {
        self.ensure_idle()?;
        if self.stream.is_some() {
            return Ok(());
        }

        match self.device.open() {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = RequesterState::LiveCapture;
                Ok(())
            }
            Err(e) => {
                self.state = RequesterState::Failed(
                    "Camera access denied. Please allow camera access to take photos of waste."
                        .into(),
                );
                Err(e.into())
            }
        }
    }

    /// 撮影せずにカメラを閉じる
    pub fn cancel_capture(&mut self) {
        self.release_stream();
        if self.state == RequesterState::LiveCapture {
            self.state = RequesterState::Idle;
        }
    }

    /// 撮影して解析を開始する
    pub fn capture_photo(&mut self) -> Result<AnalysisInput, RequesterError> {
        self.ensure_idle()?;
        let mut stream = self.stream.take().ok_or(RequesterError::NotCapturing)?;
        let frame = self.device.snapshot(&mut stream);
        stream.stop();

        match frame {
            Ok(data_url) => self.begin_with_image(data_url),
            Err(e) => {
                self.state = RequesterState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    /// アップロードされた画像で解析を開始する
    pub fn select_image(&mut self, data_url: String) -> Result<AnalysisInput, RequesterError> {
        self.ensure_idle()?;
        self.release_stream();
        self.begin_with_image(data_url)
    }

    /// テキスト説明で解析を開始する
    pub fn describe(&mut self, text: &str) -> Result<AnalysisInput, RequesterError> {
        self.ensure_idle()?;
        self.release_stream();
        self.selected_image = None;
        self.begin(AnalysisInput::from_request(None, Some(text)))
    }

    /// 解析結果を反映する（解析中でなければ無視）
    pub fn finish(&mut self, outcome: Result<WasteAnalysis, String>) {
        if self.state != RequesterState::Analyzing {
            return;
        }
        self.state = match outcome {
            Ok(analysis) => RequesterState::Done(analysis),
            Err(message) => RequesterState::Failed(message),
        };
    }

    /// 結果と選択画像を破棄して初期状態に戻る
    pub fn reset(&mut self) {
        if self.state == RequesterState::Analyzing {
            return;
        }
        self.release_stream();
        self.selected_image = None;
        self.state = RequesterState::Idle;
    }

    fn begin_with_image(&mut self, data_url: String) -> Result<AnalysisInput, RequesterError> {
        let input = AnalysisInput::from_request(Some(&data_url), None);
        self.selected_image = Some(data_url);
        self.begin(input)
    }

    fn begin(
        &mut self,
        input: crate::error::Result<AnalysisInput>,
    ) -> Result<AnalysisInput, RequesterError> {
        match input {
            Ok(input) => {
                self.state = RequesterState::Analyzing;
                Ok(input)
            }
            Err(e) => {
                self.state = RequesterState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    fn ensure_idle(&self) -> Result<(), RequesterError> {
        if self.can_trigger() {
            Ok(())
        } else {
            Err(RequesterError::Busy)
        }
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }
}

impl<D: CaptureDevice> Drop for AnalysisRequester<D> {
    fn drop(&mut self) {
        self.release_stream();
    }
}
