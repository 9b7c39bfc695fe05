//! Console summaries of channel and video statistics.

use crate::youtube_api::{Channel, Video};
use std::io::{self, Write};

pub fn write_channel(out: &mut dyn Write, channel: &Channel) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Channel Statistics:")?;
    writeln!(out, "Channel Name: {}", channel.title())?;
    writeln!(out, "Subscribers: {}", channel.subscriber_count())?;
    writeln!(out, "Videos: {}", channel.video_count())?;
    writeln!(out, "Total Views: {}", channel.view_count())
}

pub fn write_video(out: &mut dyn Write, video: &Video) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Video Statistics:")?;
    writeln!(out, "Title: {}", video.title())?;
    writeln!(out, "Views: {}", video.view_count())?;
    writeln!(out, "Likes: {}", video.like_count())?;
    writeln!(out, "Comments: {}", video.comment_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn video_with_hidden_likes() {
        let video: Video = serde_json::from_value(serde_json::json!({
            "id": "v1",
            "snippet": {"title": "Launch"},
            "statistics": {"viewCount": "1200", "commentCount": "4"}
        }))
        .unwrap();

        let mut out = Vec::new();
        write_video(&mut out, &video).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nVideo Statistics:\nTitle: Launch\nViews: 1200\nLikes: N/A\nComments: 4\n"
        );
    }
}
